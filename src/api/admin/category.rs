use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::ApiContext;
use crate::entities::category::{self, Entity as CategoryEntity};
use crate::middleware::logging::{
    error_response, internal_error, message_response, to_response, ApiError,
};

//ROUTERS
pub fn admin_category_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/category", get(admin_get_categories).post(create_category))
        .route("/category/:id", patch(patch_category).delete(delete_category))
        .layer(Extension(ctx.db))
}

//ROUTES
/// Every category, inactive ones included.
async fn admin_get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match CategoryEntity::find()
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
        .all(&*db)
        .await
    {
        Ok(categories) => to_response((StatusCode::OK, Json(categories)), Ok(())),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCategory>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            ApiError::ValidationFail(err.to_string()),
        );
    }

    if let Some(parent_id) = payload.parent_id {
        match CategoryEntity::find_by_id(parent_id).one(&*db).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let tmp = format!("Parent category with id {} not found", parent_id);
                return error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp));
            }
            Err(err) => return internal_error(ApiError::DbError(err.to_string())),
        }
    }

    let new_category = category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug.unwrap_or_else(|| slugify(&payload.name))),
        parent_id: Set(payload.parent_id),
        sort_order: Set(payload.sort_order.unwrap_or_default()),
        is_active: Set(payload.is_active.unwrap_or(true)),
        ..Default::default()
    };

    match new_category.insert(&*db).await {
        Ok(created) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": created.id,
                    "slug": created.slug,
                    "message": "Category created successfully"
                })),
            ),
            Ok(()),
        ),
        Err(err) => error_response(
            StatusCode::CONFLICT,
            "Category already exists",
            ApiError::DbError(err.to_string()),
        ),
    }
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchCategory>,
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

    let category = match CategoryEntity::find_by_id(id).one(&txn).await {
        Ok(Some(category)) => category,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };
    let mut category: category::ActiveModel = category.into();

    if let Some(name) = payload.name {
        category.name = Set(name.trim().to_string());
    }

    if let Some(slug) = payload.slug {
        category.slug = Set(slug);
    }

    if let Some(parent_id) = payload.parent_id {
        if parent_id == Some(id) {
            let tmp = "A category cannot be its own parent";
            return error_response(StatusCode::BAD_REQUEST, tmp, ApiError::General(tmp.to_string()));
        }
        if let Some(parent_id) = parent_id {
            match CategoryEntity::find_by_id(parent_id).one(&txn).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    let tmp = format!("No category with {parent_id} id was found");
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        tmp.clone(),
                        ApiError::General(tmp),
                    );
                }
                Err(err) => return internal_error(ApiError::DbError(err.to_string())),
            }
        }
        category.parent_id = Set(parent_id);
    }

    if let Some(sort_order) = payload.sort_order {
        category.sort_order = Set(sort_order);
    }

    if let Some(is_active) = payload.is_active {
        category.is_active = Set(is_active);
    }

    match category.update(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => message_response(StatusCode::OK, "Resource patched successfully."),
            Err(err) => internal_error(ApiError::DbError(err.to_string())),
        },
        //unique slug
        Err(err) => error_response(
            StatusCode::BAD_REQUEST,
            "Failed to patch this resource",
            ApiError::DbError(err.to_string()),
        ),
    }
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match CategoryEntity::delete_by_id(id).exec(&*db).await {
        Ok(result) if result.rows_affected == 0 => not_found(id),
        Ok(_) => message_response(StatusCode::OK, "Resource deleted successfully."),
        Err(err) => error_response(
            StatusCode::BAD_REQUEST,
            "Failed to delete this resource",
            ApiError::DbError(err.to_string()),
        ),
    }
}

fn not_found(id: i32) -> Response {
    let tmp = format!("No category with {} id was found.", id);
    error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp))
}

/// "Trail Running" -> "trail-running"
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

//Struct
#[derive(Deserialize, Validate, Debug)]
struct CreateCategory {
    #[validate(length(min = 1, max = 120))]
    name: String,
    #[validate(regex(path = *SLUG_REGEX))]
    slug: Option<String>,
    parent_id: Option<i32>,
    sort_order: Option<i32>,
    is_active: Option<bool>,
}

#[derive(Deserialize, Validate)]
struct PatchCategory {
    #[validate(length(min = 1, max = 120))]
    name: Option<String>,
    #[validate(regex(path = *SLUG_REGEX))]
    slug: Option<String>,
    #[serde(default, deserialize_with = "crate::api::double_option")]
    parent_id: Option<Option<i32>>,
    sort_order: Option<i32>,
    is_active: Option<bool>,
}

static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Trail Running"), "trail-running");
        assert_eq!(slugify("  Kids' Shoes & Boots "), "kids-shoes-boots");
        assert_eq!(slugify("Sale!"), "sale");
    }

    #[test]
    fn slug_must_be_kebab_case() {
        assert!(SLUG_REGEX.is_match("trail-running"));
        assert!(!SLUG_REGEX.is_match("Trail Running"));
        assert!(!SLUG_REGEX.is_match("-edge"));
    }
}
