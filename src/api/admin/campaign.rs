use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::api::ApiContext;
use crate::entities::{
    campaign::{self, Entity as CampaignEntity},
    product,
};
use crate::middleware::logging::{
    error_response, internal_error, message_response, to_response, ApiError,
};

//ROUTERS
pub fn admin_campaign_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/campaign", get(get_campaigns).post(create_campaign))
        .route("/campaign/:id", patch(patch_campaign).delete(delete_campaign))
        .layer(Extension(ctx.db))
}

//ROUTES
async fn get_campaigns(
    Query(params): Query<CampaignsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let mut half_result = CampaignEntity::find().order_by_desc(campaign::Column::StartsAt);

    if let Some(product_id) = params.product_id {
        half_result = half_result.filter(campaign::Column::ProductId.eq(product_id));
    }

    if Some(true) == params.running {
        let now = Utc::now();
        half_result = half_result
            .filter(campaign::Column::IsActive.eq(true))
            .filter(campaign::Column::StartsAt.lte(now))
            .filter(campaign::Column::EndsAt.gte(now));
    }

    match half_result.all(&*db).await {
        Ok(campaigns) => to_response((StatusCode::OK, Json(campaigns)), Ok(())),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn create_campaign(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCampaign>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            ApiError::ValidationFail(err.to_string()),
        );
    }

    match product::Entity::find_by_id(payload.product_id).one(&*db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let tmp = format!("No product with {} id was found.", payload.product_id);
            return error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp));
        }
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    }

    let new_campaign = campaign::ActiveModel {
        product_id: Set(payload.product_id),
        name: Set(payload.name),
        discount_price: Set(payload.discount_price),
        starts_at: Set(payload.starts_at),
        ends_at: Set(payload.ends_at),
        is_active: Set(payload.is_active.unwrap_or(true)),
        ..Default::default()
    };

    match new_campaign.insert(&*db).await {
        Ok(created) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": created.id,
                    "message": "Campaign created successfully"
                })),
            ),
            Ok(()),
        ),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn patch_campaign(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchCampaign>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let existing = match CampaignEntity::find_by_id(id).one(&*db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    let starts_at = payload.starts_at.unwrap_or(existing.starts_at);
    let ends_at = payload.ends_at.unwrap_or(existing.ends_at);
    if ends_at <= starts_at {
        let tmp = "Campaign must end after it starts";
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            tmp,
            ApiError::ValidationFail(tmp.to_string()),
        );
    }

    let mut campaign: campaign::ActiveModel = existing.into();
    campaign.starts_at = Set(starts_at);
    campaign.ends_at = Set(ends_at);

    if let Some(name) = payload.name {
        campaign.name = Set(name);
    }

    if let Some(discount_price) = payload.discount_price {
        campaign.discount_price = Set(discount_price);
    }

    if let Some(is_active) = payload.is_active {
        campaign.is_active = Set(is_active);
    }

    match campaign.update(&*db).await {
        Ok(_) => message_response(StatusCode::OK, "Resource patched successfully."),
        Err(err) => error_response(
            StatusCode::BAD_REQUEST,
            "Failed to patch this resource",
            ApiError::DbError(err.to_string()),
        ),
    }
}

async fn delete_campaign(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match CampaignEntity::delete_by_id(id).exec(&*db).await {
        Ok(result) if result.rows_affected == 0 => not_found(id),
        Ok(_) => message_response(StatusCode::OK, "Resource deleted successfully."),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

fn not_found(id: i32) -> Response {
    let tmp = format!("No campaign with {} id was found.", id);
    error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp))
}

fn validate_window(payload: &CreateCampaign) -> Result<(), ValidationError> {
    if payload.ends_at <= payload.starts_at {
        return Err(ValidationError::new("ends_before_start"));
    }
    Ok(())
}

//Structs
#[derive(Deserialize)]
struct CampaignsQuery {
    product_id: Option<i32>,
    running: Option<bool>,
}

#[derive(Deserialize, Validate, Debug)]
#[validate(schema(function = "validate_window"))]
struct CreateCampaign {
    product_id: i32,
    #[validate(length(min = 1, max = 120))]
    name: String,
    #[validate(range(min = 0.0))]
    discount_price: f64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_active: Option<bool>,
}

#[derive(Deserialize, Validate)]
struct PatchCampaign {
    #[validate(length(min = 1, max = 120))]
    name: Option<String>,
    #[validate(range(min = 0.0))]
    discount_price: Option<f64>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn campaign_window_must_be_positive() {
        let starts_at = Utc::now();
        let mut payload = CreateCampaign {
            product_id: 1,
            name: "Spring sale".to_string(),
            discount_price: 59.9,
            starts_at,
            ends_at: starts_at - Duration::hours(1),
            is_active: None,
        };
        assert!(payload.validate().is_err());

        payload.ends_at = starts_at + Duration::days(7);
        assert!(payload.validate().is_ok());
    }
}
