pub mod admin;
pub mod public;

use axum::{http::StatusCode, response::Response, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::media::ImageUrlNormalizer;
use crate::middleware::logging::message_response;
use crate::queue::TaskQueue;

use admin::admin_api_router;
use public::{public_api_router, storage::storage_router};

/// What the handlers need, injected once when the router is built.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<DatabaseConnection>,
    pub queue: Arc<dyn TaskQueue>,
    pub images: Arc<ImageUrlNormalizer>,
    pub config: Arc<AppConfig>,
}

pub fn create_api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(health_check))
        .nest("/api", public_api_router(ctx.clone()))
        .nest("/api/admin", admin_api_router(ctx.clone()))
        .merge(storage_router(ctx.config.storage_dir.clone()))
}

async fn health_check() -> Response {
    message_response(StatusCode::OK, "Shoe shop API is running.")
}

/// Lets a PATCH payload tell an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
