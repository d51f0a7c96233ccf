use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use crate::api::ApiContext;
use crate::catalog::{pricing, AttachedImage, ProductRecord};
use crate::entities::{
    campaign, category, image,
    product::{self, Entity as ProductEntity, Gender},
    product_category, product_size_stock,
};
use crate::media::ImageUrlNormalizer;
use crate::middleware::logging::{error_response, internal_error, to_response, ApiError};

pub fn product_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/product", get(get_products))
        .route("/product/:id", get(get_product))
        .layer(Extension(ctx.db))
        .layer(Extension(ctx.images))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(images): Extension<Arc<ImageUrlNormalizer>>,
) -> Response {
    let mut half_result = ProductEntity::find()
        .filter(product::Column::IsAvailable.eq(true))
        .order_by_desc(product::Column::CreatedAt);

    if Some(true) == params.featured {
        half_result = half_result.filter(product::Column::IsFeatured.eq(true));
    }

    if let Some(gender) = params.gender {
        half_result = half_result.filter(product::Column::Gender.eq(gender));
    }

    if let Some(min) = params.min {
        half_result = half_result.filter(product::Column::Price.gte(min));
    }

    if let Some(max) = params.max {
        half_result = half_result.filter(product::Column::Price.lte(max));
    }

    if let Some(slug) = params.category {
        match product_ids_in_category(&*db, &slug).await {
            Ok(ids) => half_result = half_result.filter(product::Column::Id.is_in(ids)),
            Err(err) => return internal_error(ApiError::DbError(err.to_string())),
        }
    }

    let result = half_result.find_also_related(image::Entity).all(&*db).await;
    let records: Vec<ProductRecord> = match result {
        Ok(rows) => rows
            .into_iter()
            .map(|(product, image)| ProductRecord::new(product, image))
            .collect(),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    match product_views(&*db, records, &images, Utc::now()).await {
        Ok(response) => to_response((StatusCode::OK, Json(response)), Ok(())),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(images): Extension<Arc<ImageUrlNormalizer>>,
) -> Response {
    let result = ProductEntity::find_by_id(id)
        .filter(product::Column::IsAvailable.eq(true))
        .find_also_related(image::Entity)
        .one(&*db)
        .await;

    let record = match result {
        Ok(Some((product, image))) => ProductRecord::new(product, image),
        Ok(None) => {
            let tmp = format!("No product with {} id was found.", id);
            return error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp));
        }
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    match product_views(&*db, vec![record], &images, Utc::now()).await {
        Ok(mut views) => match views.pop() {
            Some(view) => to_response((StatusCode::OK, Json(view)), Ok(())),
            None => internal_error(ApiError::General("Product view went missing".to_string())),
        },
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

/// Products in the category with this slug or any of its direct children.
async fn product_ids_in_category<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
) -> Result<Vec<i32>, DbErr> {
    let Some(root) = category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .filter(category::Column::IsActive.eq(true))
        .one(conn)
        .await?
    else {
        return Ok(Vec::new());
    };

    let mut category_ids: Vec<i32> = category::Entity::find()
        .filter(category::Column::ParentId.eq(root.id))
        .filter(category::Column::IsActive.eq(true))
        .all(conn)
        .await?
        .into_iter()
        .map(|child| child.id)
        .collect();
    category_ids.push(root.id);

    let links = product_category::Entity::find()
        .filter(product_category::Column::CategoryId.is_in(category_ids))
        .all(conn)
        .await?;

    let mut ids: Vec<i32> = links.into_iter().map(|link| link.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Joins size stock, campaigns and categories onto the records in three
/// queries and resolves each product's display image.
pub(crate) async fn product_views<C: ConnectionTrait>(
    conn: &C,
    records: Vec<ProductRecord>,
    images: &ImageUrlNormalizer,
    now: DateTime<Utc>,
) -> Result<Vec<ProductResponse>, DbErr> {
    let ids: Vec<i32> = records.iter().map(|record| record.product.id).collect();

    let mut sizes: HashMap<i32, Vec<SizeStock>> = HashMap::new();
    for row in product_size_stock::Entity::find()
        .filter(product_size_stock::Column::ProductId.is_in(ids.clone()))
        .order_by_asc(product_size_stock::Column::Size)
        .all(conn)
        .await?
    {
        sizes.entry(row.product_id).or_default().push(SizeStock {
            size: row.size,
            quantity: row.quantity,
        });
    }

    let campaigns = campaign::Entity::find()
        .filter(campaign::Column::ProductId.is_in(ids.clone()))
        .all(conn)
        .await?;

    let mut categories: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in product_category::Entity::find()
        .filter(product_category::Column::ProductId.is_in(ids))
        .all(conn)
        .await?
    {
        categories
            .entry(link.product_id)
            .or_default()
            .push(link.category_id);
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let image_url = images.from_product(Some(&record));
            let price = pricing::price_for(&record.product, &campaigns, now);
            let id = record.product.id;
            ProductResponse {
                id,
                name: record.product.name,
                description: record.product.description,
                gender: record.product.gender,
                image_url,
                image: record.attached_image,
                price: price.price,
                effective_price: price.effective_price,
                campaign: price.campaign,
                stock: record.product.stock,
                sizes: sizes.remove(&id).unwrap_or_default(),
                category_ids: categories.remove(&id).unwrap_or_default(),
                is_featured: record.product.is_featured,
                is_available: record.product.is_available,
            }
        })
        .collect())
}

#[derive(Deserialize)]
struct GetProductsQuery {
    featured: Option<bool>,
    gender: Option<Gender>,
    category: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Serialize)]
pub(crate) struct SizeStock {
    size: String,
    quantity: i32,
}

#[derive(Serialize)]
pub(crate) struct ProductResponse {
    id: i32,
    name: String,
    description: String,
    gender: Gender,
    image_url: Option<String>,
    image: Option<AttachedImage>,
    price: f64,
    effective_price: f64,
    campaign: Option<pricing::CampaignSummary>,
    stock: i32,
    sizes: Vec<SizeStock>,
    category_ids: Vec<i32>,
    is_featured: bool,
    is_available: bool,
}
