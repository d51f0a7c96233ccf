use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::api::ApiContext;
use crate::entities::order::{self, Entity as OrderEntity, Status};
use crate::media::ImageUrlNormalizer;
use crate::middleware::logging::{error_response, internal_error, to_response, ApiError};
use crate::orders::status::{update_status, StatusUpdate};
use crate::orders::{OrderStore, SeaOrderStore, StatusTransition};
use crate::queue::{Job, OrderStatusChanged, QueueError, TaskQueue};

const PAGE_SIZE: u64 = 50;

//ROUTERS
pub fn admin_order_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/order", get(get_orders))
        .route("/order/:id", get(get_order))
        .route("/order/:id/status", patch(patch_order_status))
        .layer(Extension(ctx.db))
        .layer(Extension(ctx.images))
        .layer(Extension(ctx.queue))
}

//ROUTES
/// Newest first. `search` matches reference, customer name or email.
async fn get_orders(
    Query(params): Query<OrdersQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(images): Extension<Arc<ImageUrlNormalizer>>,
) -> Response {
    let mut half_result = OrderEntity::find().order_by_desc(order::Column::CreatedAt);

    if let Some(status) = params.status {
        half_result = half_result.filter(order::Column::Status.eq(status));
    }

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        half_result = half_result.filter(
            Condition::any()
                .add(order::Column::Reference.contains(search))
                .add(order::Column::CustomerName.contains(search))
                .add(order::Column::CustomerEmail.contains(search)),
        );
    }

    let page = params.page.unwrap_or(1).max(1);
    match half_result
        .paginate(&*db, PAGE_SIZE)
        .fetch_page(page - 1)
        .await
    {
        Ok(orders) => {
            let orders: Vec<OrderResponse> = orders
                .into_iter()
                .map(|order| {
                    let image_url = images.for_order(&order, None);
                    OrderResponse { order, image_url }
                })
                .collect();
            to_response((StatusCode::OK, Json(orders)), Ok(()))
        }
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(images): Extension<Arc<ImageUrlNormalizer>>,
) -> Response {
    match SeaOrderStore::new(db).load_with_product(id).await {
        Ok(Some(ctx)) => {
            let image_url = images.for_order(&ctx.order, ctx.product.as_ref());
            to_response(
                (
                    StatusCode::OK,
                    Json(OrderResponse {
                        order: ctx.order,
                        image_url,
                    }),
                ),
                Ok(()),
            )
        }
        Ok(None) => not_found(id),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

/// Any status may be set. A real change enqueues the customer notification
/// once the new status is committed; setting the current status is a no-op.
async fn patch_order_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(queue): Extension<Arc<dyn TaskQueue>>,
    Json(payload): Json<PatchStatus>,
) -> Response {
    let (order, transition) = match update_status(&*db, id, payload.status).await {
        Ok(StatusUpdate::Changed { order, transition }) => (order, Some(transition)),
        Ok(StatusUpdate::Unchanged(order)) => (order, None),
        Ok(StatusUpdate::NotFound) => return not_found(id),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };

    let ext = match enqueue_transition(queue.as_ref(), order.id, transition).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!(order_id = order.id, error = %err, "Failed to enqueue status notification");
            Err(ApiError::QueueError(err.to_string()))
        }
    };

    to_response(
        (
            StatusCode::OK,
            Json(StatusResponse {
                id: order.id,
                reference: order.reference,
                status: order.status,
                transition,
            }),
        ),
        ext,
    )
}

/// One `OrderStatusChanged` job per real transition, nothing otherwise.
async fn enqueue_transition(
    queue: &dyn TaskQueue,
    order_id: i32,
    transition: Option<StatusTransition>,
) -> Result<(), QueueError> {
    match transition {
        Some(StatusTransition { from, to }) => {
            queue
                .dispatch(Job::OrderStatusChanged(OrderStatusChanged { order_id, from, to }))
                .await
        }
        None => Ok(()),
    }
}

fn not_found(id: i32) -> Response {
    let tmp = format!("No order with {} id was found.", id);
    error_response(StatusCode::NOT_FOUND, tmp.clone(), ApiError::General(tmp))
}

//Structs
#[derive(Deserialize)]
struct OrdersQuery {
    status: Option<Status>,
    search: Option<String>,
    page: Option<u64>,
}

#[derive(Deserialize)]
struct PatchStatus {
    status: Status,
}

#[derive(Serialize)]
struct OrderResponse {
    #[serde(flatten)]
    order: order::Model,
    image_url: Option<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    id: i32,
    reference: String,
    status: Status,
    /// `null` when the order already had the requested status.
    transition: Option<StatusTransition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveModelTrait, DatabaseConnection};

    use crate::entities::setup_schema;
    use crate::notifications::fixtures::order;
    use crate::queue::fixtures::RecordingQueue;

    async fn database_with_pending_order() -> DatabaseConnection {
        let db = crate::connect("sqlite::memory:").await.unwrap();
        setup_schema(&db).await.unwrap();

        let mut pending = order();
        pending.product_id = None;
        let active: order::ActiveModel = pending.into();
        active.reset_all().insert(&db).await.unwrap();
        db
    }

    async fn change_status(db: &DatabaseConnection, queue: &RecordingQueue, to: Status) {
        let transition = match update_status(db, 41, to).await.unwrap() {
            StatusUpdate::Changed { transition, .. } => Some(transition),
            StatusUpdate::Unchanged(_) => None,
            StatusUpdate::NotFound => panic!("order 41 should exist"),
        };
        enqueue_transition(queue, 41, transition).await.unwrap();
    }

    #[tokio::test]
    async fn confirming_a_pending_order_enqueues_one_job() {
        let db = database_with_pending_order().await;
        let queue = RecordingQueue::default();

        change_status(&db, &queue, Status::Confirmed).await;

        assert_eq!(
            queue.jobs(),
            vec![Job::OrderStatusChanged(OrderStatusChanged {
                order_id: 41,
                from: Status::Pending,
                to: Status::Confirmed,
            })]
        );
    }

    #[tokio::test]
    async fn repeating_the_current_status_enqueues_nothing() {
        let db = database_with_pending_order().await;
        let queue = RecordingQueue::default();

        change_status(&db, &queue, Status::Pending).await;

        assert!(queue.jobs().is_empty());
    }
}
