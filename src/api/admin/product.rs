use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};
use validator::Validate;

use crate::api::public::product::product_views;
use crate::api::ApiContext;
use crate::catalog::load_product_record;
use crate::entities::{
    category, image,
    product::{self, Entity as ProductEntity, Gender},
    product_category, product_size_stock,
};
use crate::media::ImageUrlNormalizer;
use crate::middleware::logging::{
    error_response, internal_error, message_response, to_response, ApiError,
};

const MAX_SIZE_QUANTITY: i32 = 100_000;

//ROUTERS
pub fn admin_product_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/product", post(create_product))
        .route(
            "/product/:id",
            get(admin_get_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/product/:id/sizes", put(replace_sizes))
        .route("/product/:id/categories", put(replace_categories))
        .layer(Extension(ctx.db))
        .layer(Extension(ctx.images))
}

//ROUTES
async fn admin_get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(images): Extension<Arc<ImageUrlNormalizer>>,
) -> Response {
    let record = match load_product_record(&*db, id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    match product_views(&*db, vec![record], &images, Utc::now()).await {
        Ok(mut views) => match views.pop() {
            Some(view) => to_response((StatusCode::OK, Json(view)), Ok(())),
            None => not_found(id),
        },
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateProduct>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            ApiError::ValidationFail(err.to_string()),
        );
    }

    if let Some(image_id) = payload.image_id {
        match image::Entity::find_by_id(image_id).one(&*db).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let tmp = format!("Image with id {} not found", image_id);
                return error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp));
            }
            Err(err) => return internal_error(ApiError::DbError(err.to_string())),
        }
    }

    let new_product = product::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        image: Set(payload.image),
        image_id: Set(payload.image_id),
        stock: Set(0),
        gender: Set(payload.gender),
        is_featured: Set(payload.is_featured.unwrap_or_default()),
        is_available: Set(payload.is_available.unwrap_or(true)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_product.insert(&*db).await {
        Ok(created) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": created.id,
                    "message": "Product created successfully"
                })),
            ),
            Ok(()),
        ),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchProductPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error(ApiError::TransactionCreationFailed),
    };

    let product = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(product)) => product,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };
    let mut product: product::ActiveModel = product.into();

    if let Some(name) = payload.name {
        product.name = Set(name);
    }

    if let Some(description) = payload.description {
        product.description = Set(description);
    }

    if let Some(price) = payload.price {
        product.price = Set(price);
    }

    if let Some(image) = payload.image {
        product.image = Set(image.filter(|path| !path.trim().is_empty()));
    }

    if let Some(image_id) = payload.image_id {
        if let Some(image_id) = image_id {
            match image::Entity::find_by_id(image_id).one(&txn).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    let tmp = format!("No image with {image_id} id was found");
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        tmp.clone(),
                        ApiError::General(tmp),
                    );
                }
                Err(err) => return internal_error(ApiError::DbError(err.to_string())),
            }
        }
        product.image_id = Set(image_id);
    }

    if let Some(gender) = payload.gender {
        product.gender = Set(gender);
    }

    if let Some(is_featured) = payload.is_featured {
        product.is_featured = Set(is_featured);
    }

    if let Some(is_available) = payload.is_available {
        product.is_available = Set(is_available);
    }

    match product.update(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => message_response(StatusCode::OK, "Resource patched successfully."),
            Err(err) => internal_error(ApiError::DbError(err.to_string())),
        },
        Err(err) => error_response(
            StatusCode::BAD_REQUEST,
            "Failed to patch this resource",
            ApiError::DbError(err.to_string()),
        ),
    }
}

/// Existing orders keep their snapshot; only the informational link is lost.
async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match ProductEntity::delete_by_id(id).exec(&*db).await {
        Ok(result) if result.rows_affected == 0 => not_found(id),
        Ok(_) => message_response(StatusCode::OK, "Resource deleted successfully."),
        Err(err) => error_response(
            StatusCode::BAD_REQUEST,
            "Failed to delete this resource",
            ApiError::DbError(err.to_string()),
        ),
    }
}

/// Replaces the size table; the product's total stock becomes the sum.
async fn replace_sizes(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<ReplaceSizes>,
) -> Response {
    let (sizes, total) = match size_table(payload.sizes) {
        Ok(table) => table,
        Err(tmp) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                tmp,
                ApiError::ValidationFail(tmp.to_string()),
            )
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error(ApiError::TransactionCreationFailed),
    };

    let product = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(product)) => product,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    if let Err(err) = product_size_stock::Entity::delete_many()
        .filter(product_size_stock::Column::ProductId.eq(id))
        .exec(&txn)
        .await
    {
        return internal_error(ApiError::DbError(err.to_string()));
    }

    if !sizes.is_empty() {
        let rows = sizes.into_iter().map(|(size, quantity)| product_size_stock::ActiveModel {
            product_id: Set(id),
            size: Set(size),
            quantity: Set(quantity),
            ..Default::default()
        });
        if let Err(err) = product_size_stock::Entity::insert_many(rows).exec(&txn).await {
            return internal_error(ApiError::DbError(err.to_string()));
        }
    }

    let mut product: product::ActiveModel = product.into();
    product.stock = Set(total);
    if let Err(err) = product.update(&txn).await {
        return internal_error(ApiError::DbError(err.to_string()));
    }

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Sizes updated successfully.",
                    "stock": total
                })),
            ),
            Ok(()),
        ),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn replace_categories(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<ReplaceCategories>,
) -> Response {
    let mut category_ids = payload.category_ids;
    category_ids.sort_unstable();
    category_ids.dedup();

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error(ApiError::TransactionCreationFailed),
    };

    match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    }

    match category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids.clone()))
        .all(&txn)
        .await
    {
        Ok(found) if found.len() == category_ids.len() => {}
        Ok(_) => {
            let tmp = "One or more categories do not exist";
            return error_response(StatusCode::BAD_REQUEST, tmp, ApiError::General(tmp.to_string()));
        }
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    }

    if let Err(err) = product_category::Entity::delete_many()
        .filter(product_category::Column::ProductId.eq(id))
        .exec(&txn)
        .await
    {
        return internal_error(ApiError::DbError(err.to_string()));
    }

    if !category_ids.is_empty() {
        let links = category_ids.iter().map(|&category_id| product_category::ActiveModel {
            product_id: Set(id),
            category_id: Set(category_id),
        });
        if let Err(err) = product_category::Entity::insert_many(links).exec(&txn).await {
            return internal_error(ApiError::DbError(err.to_string()));
        }
    }

    match txn.commit().await {
        Ok(_) => message_response(StatusCode::OK, "Categories updated successfully."),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

/// Deduplicated size table (last entry per size wins) and its total stock.
fn size_table(entries: Vec<SizeEntry>) -> Result<(BTreeMap<String, i32>, i32), &'static str> {
    let mut sizes: BTreeMap<String, i32> = BTreeMap::new();
    for entry in entries {
        let size = entry.size.trim().to_string();
        if size.is_empty() || !(0..=MAX_SIZE_QUANTITY).contains(&entry.quantity) {
            return Err("Sizes must be non-empty and quantities between 0 and 100000");
        }
        sizes.insert(size, entry.quantity);
    }

    let total = sizes
        .values()
        .try_fold(0i32, |total, &quantity| total.checked_add(quantity))
        .ok_or("Total stock is too large")?;

    Ok((sizes, total))
}

fn not_found(id: i32) -> Response {
    let tmp = format!("No product with {} id was found.", id);
    error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp))
}

//Structs
#[derive(Deserialize, Validate, Debug)]
struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[serde(default)]
    description: String,
    #[validate(range(min = 0.0))]
    price: f64,
    image: Option<String>,
    image_id: Option<i32>,
    gender: Gender,
    is_featured: Option<bool>,
    is_available: Option<bool>,
}

/// `image` and `image_id` distinguish "leave alone" (absent) from "clear"
/// (`null`).
#[derive(Deserialize, Validate)]
struct PatchProductPayload {
    #[validate(length(min = 1, max = 200))]
    name: Option<String>,
    description: Option<String>,
    #[validate(range(min = 0.0))]
    price: Option<f64>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    image: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    image_id: Option<Option<i32>>,
    gender: Option<Gender>,
    is_featured: Option<bool>,
    is_available: Option<bool>,
}

#[derive(Deserialize)]
struct SizeEntry {
    size: String,
    quantity: i32,
}

#[derive(Deserialize)]
struct ReplaceSizes {
    sizes: Vec<SizeEntry>,
}

#[derive(Deserialize)]
struct ReplaceCategories {
    category_ids: Vec<i32>,
}
