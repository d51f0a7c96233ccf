use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;

use crate::api::ApiContext;
use crate::entities::category::{self, Entity as CategoryEntity};
use crate::middleware::logging::{error_response, internal_error, to_response, ApiError};

pub fn category_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/category", get(get_categories))
        .route("/category/:slug", get(get_category))
        .layer(Extension(ctx.db))
}

async fn get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    let result = CategoryEntity::find()
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
        .all(&*db)
        .await;

    match result {
        Ok(categories) => {
            let response: Vec<CategoryResponse> =
                categories.into_iter().map(CategoryResponse::new).collect();
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn get_category(
    Path(slug): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let result = CategoryEntity::find()
        .filter(category::Column::Slug.eq(slug.as_str()))
        .filter(category::Column::IsActive.eq(true))
        .one(&*db)
        .await;

    let category = match result {
        Ok(Some(category)) => category,
        Ok(None) => {
            let tmp = format!("No category with {} slug was found.", slug);
            return error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp));
        }
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    let children = CategoryEntity::find()
        .filter(category::Column::ParentId.eq(category.id))
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::SortOrder)
        .all(&*db)
        .await;

    match children {
        Ok(children) => {
            let mut response = CategoryResponse::new(category);
            response.children = Some(children.into_iter().map(CategoryResponse::new).collect());
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

#[derive(Serialize)]
pub(crate) struct CategoryResponse {
    id: i32,
    name: String,
    slug: String,
    parent_id: Option<i32>,
    sort_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<CategoryResponse>>,
}

impl CategoryResponse {
    pub(crate) fn new(value: category::Model) -> CategoryResponse {
        CategoryResponse {
            id: value.id,
            name: value.name,
            slug: value.slug,
            parent_id: value.parent_id,
            sort_order: value.sort_order,
            children: None,
        }
    }
}
