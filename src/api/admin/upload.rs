use axum::{
    extract::{DefaultBodyLimit, Extension, Multipart, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{patch, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};
use tokio::fs as tokio_fs;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::api::ApiContext;
use crate::entities::image::{self, Entity as ImageEntity, FileExtension};
use crate::middleware::logging::{
    error_response, internal_error, message_response, to_response, ApiError,
};

//Routers
pub fn upload_router(ctx: ApiContext) -> Router {
    let limit = UploadLimit(ctx.config.file_size_limit);
    Router::new()
        .route("/image", post(upload).get(get_images))
        .route("/image/:id", patch(patch_image).delete(delete_image))
        // Leave room for the multipart framing around the file itself.
        .layer(DefaultBodyLimit::max(limit.0 + 64 * 1024))
        .layer(Extension(ctx.db))
        .layer(Extension(MediaDir(ctx.config.storage_dir.join("media"))))
        .layer(Extension(limit))
}

#[derive(Clone)]
struct MediaDir(PathBuf);

#[derive(Clone, Copy)]
struct UploadLimit(usize);

//Routes
/// Takes the first multipart field. Its field name becomes the image's
/// display name.
async fn upload(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(MediaDir(media_dir)): Extension<MediaDir>,
    Extension(UploadLimit(limit)): Extension<UploadLimit>,
    mut multipart: Multipart,
) -> Response {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            let tmp = "No file in request.";
            return error_response(StatusCode::BAD_REQUEST, tmp, ApiError::General(tmp.to_string()));
        }
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Malformed multipart body.",
                ApiError::General(format!("Multipart error: {err}")),
            )
        }
    };

    let Some(content_type) = field.content_type().map(str::to_owned) else {
        let tmp = "Content type is not set.";
        return error_response(StatusCode::BAD_REQUEST, tmp, ApiError::General(tmp.to_string()));
    };

    let Some(extension) = FileExtension::from_content_type(&content_type) else {
        let tmp = "Unsupported content type.";
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            tmp,
            ApiError::General(format!("{tmp} {content_type}")),
        );
    };

    let file_name = match field.name() {
        Some(name) if FILE_NAME_REGEX.is_match(name) => name.to_owned(),
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid file name. It should contain only Latin letters, numbers, '-', or '_'.",
                ApiError::General("Regex match failed".to_string()),
            )
        }
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read file bytes.",
                ApiError::General(format!("Multipart error: {err}")),
            )
        }
    };
    if data.len() > limit {
        let tmp = "Payload too large";
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            tmp,
            ApiError::General(tmp.to_string()),
        );
    }

    if let Err(err) = tokio_fs::create_dir_all(&media_dir).await {
        return internal_error(ApiError::StorageError(err.to_string()));
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error(ApiError::TransactionCreationFailed),
    };

    let path_name = Uuid::new_v4().to_string();
    let new_image = image::ActiveModel {
        file_name: Set(file_name),
        path_name: Set(path_name.clone()),
        extension: Set(extension),
        ..Default::default()
    };

    let created = match new_image.insert(&txn).await {
        Ok(created) => created,
        Err(err) => {
            return error_response(
                StatusCode::CONFLICT,
                "Image already exists",
                ApiError::DbError(err.to_string()),
            )
        }
    };

    let file_path = media_dir.join(format!("{path_name}.{extension}"));
    if let Err(err) = tokio_fs::write(&file_path, &data).await {
        let _ = txn.rollback().await;
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to upload file to the server",
            ApiError::StorageError(err.to_string()),
        );
    }

    match txn.commit().await {
        Ok(_) => to_response(
            (StatusCode::CREATED, Json(ImageResponse::from(created))),
            Ok(()),
        ),
        Err(err) => {
            let _ = tokio_fs::remove_file(&file_path).await;
            internal_error(ApiError::DbError(err.to_string()))
        }
    }
}

async fn get_images(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(query): Query<ImagesQuery>,
) -> Response {
    let filter = match query.query {
        Some(query) => {
            let mut condition = Condition::any().add(image::Column::FileName.contains(&query));
            if let Ok(id) = query.parse::<i32>() {
                condition = condition.add(image::Column::Id.eq(id));
            }
            condition
        }
        None => Condition::all(),
    };

    match ImageEntity::find()
        .filter(filter)
        .order_by_desc(image::Column::Id)
        .all(&*db)
        .await
    {
        Ok(images) => {
            let images: Vec<ImageResponse> = images.into_iter().map(ImageResponse::from).collect();
            to_response((StatusCode::OK, Json(images)), Ok(()))
        }
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn patch_image(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchImagePayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid file name. It should contain only Latin letters, numbers, '-', or '_'.",
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let image = match ImageEntity::find_by_id(id).one(&*db).await {
        Ok(Some(image)) => image,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    let mut image: image::ActiveModel = image.into();
    image.file_name = Set(payload.file_name);
    match image.update(&*db).await {
        Ok(_) => message_response(StatusCode::OK, "Resource patched successfully."),
        Err(err) => error_response(
            StatusCode::BAD_REQUEST,
            "Failed to patch this resource",
            ApiError::DbError(err.to_string()),
        ),
    }
}

/// Products pointing at the image fall back to their legacy `image` column.
async fn delete_image(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(MediaDir(media_dir)): Extension<MediaDir>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error(ApiError::TransactionCreationFailed),
    };

    let image = match ImageEntity::find_by_id(id).one(&txn).await {
        Ok(Some(image)) => image,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };
    let file_path = media_dir.join(format!("{}.{}", image.path_name, image.extension));

    let image: image::ActiveModel = image.into();
    if let Err(err) = image.delete(&txn).await {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Failed to delete this resource",
            ApiError::DbError(err.to_string()),
        );
    }

    if let Err(err) = txn.commit().await {
        return internal_error(ApiError::DbError(err.to_string()));
    }

    // The row is gone either way; a missing file is only worth a warning.
    if let Err(err) = tokio_fs::remove_file(&file_path).await {
        warn!(image_id = id, path = %file_path.display(), error = %err, "Failed to remove image file");
    }

    message_response(StatusCode::OK, "Resource deleted successfully.")
}

fn not_found(id: i32) -> Response {
    let tmp = format!("No image with id {} was found.", id);
    error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp))
}

//structs
#[derive(Deserialize, Validate)]
struct PatchImagePayload {
    #[validate(regex(path = *FILE_NAME_REGEX))]
    file_name: String,
}

#[derive(Deserialize)]
struct ImagesQuery {
    query: Option<String>,
}

#[derive(Serialize)]
struct ImageResponse {
    id: i32,
    file_name: String,
    extension: FileExtension,
    url: String,
}

impl From<image::Model> for ImageResponse {
    fn from(value: image::Model) -> Self {
        ImageResponse {
            url: value.url(),
            id: value.id,
            file_name: value.file_name,
            extension: value.extension,
        }
    }
}

static FILE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,64}$").unwrap());
