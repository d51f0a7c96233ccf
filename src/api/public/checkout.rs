use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

use crate::api::ApiContext;
use crate::middleware::logging::{error_response, internal_error, to_response, ApiError};
use crate::orders::checkout::{place_order, CheckoutError, CheckoutRequest};
use crate::queue::{Job, OrderPlaced, TaskQueue};

pub fn checkout_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/checkout", post(checkout))
        .layer(Extension(ctx.db))
        .layer(Extension(ctx.queue))
}

async fn checkout(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Json(payload): Json<CheckoutRequest>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let order = match place_order(&*db, payload, Utc::now()).await {
        Ok(order) => order,
        Err(CheckoutError::Db(err)) => return internal_error(ApiError::DbError(err.to_string())),
        Err(err @ CheckoutError::ProductNotFound(_)) => {
            return error_response(StatusCode::NOT_FOUND, err.to_string(), ApiError::General(err.to_string()))
        }
        Err(err) => {
            return error_response(StatusCode::CONFLICT, err.to_string(), ApiError::General(err.to_string()))
        }
    };

    info!(
        order_id = order.id,
        reference = %order.reference,
        total = order.total,
        "Order placed"
    );

    // The order is committed; a queue failure only costs the emails.
    let ext = match queue
        .dispatch(Job::OrderPlaced(OrderPlaced { order_id: order.id }))
        .await
    {
        Ok(()) => Ok(()),
        Err(err) => {
            error!(order_id = order.id, error = %err, "Failed to enqueue order placed notification");
            Err(ApiError::QueueError(err.to_string()))
        }
    };

    to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "id": order.id,
                "reference": order.reference,
                "status": order.status,
                "total": order.total,
            })),
        ),
        ext,
    )
}
