pub mod api;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod mail;
pub mod media;
pub mod middleware;
pub mod notifications;
pub mod orders;
pub mod queue;

use axum::{middleware::from_fn, Router};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_api_router, ApiContext};
use crate::config::AppConfig;
use crate::entities::{primary_setup, setup_schema};
use crate::mail::Mailer;
use crate::media::ImageUrlNormalizer;
use crate::middleware::logging::logging_middleware;
use crate::notifications::Notifier;
use crate::orders::SeaOrderStore;
use crate::queue::TokioTaskQueue;

const QUEUE_CAPACITY: usize = 1024;

pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    // Every pooled connection to `sqlite::memory:` would be its own database.
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);

    Database::connect(options).await
}

/// Prepares the schema and the admin account, starts the notification queue
/// and returns the full HTTP application.
pub async fn build_app(
    config: AppConfig,
    db: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
) -> Result<Router, DbErr> {
    setup_schema(&db).await?;
    primary_setup(&db, &config.admin_username, &config.admin_password).await?;

    let db = Arc::new(db);
    let images = ImageUrlNormalizer::new(config.app_url.clone());

    let notifier = Notifier::new(
        Arc::new(SeaOrderStore::new(db.clone())),
        mailer,
        images.clone(),
        config.admin_email.clone(),
    );
    let queue = TokioTaskQueue::start(Arc::new(notifier), config.retry, QUEUE_CAPACITY);
    info!(
        max_attempts = config.retry.max_attempts,
        "Notification queue started"
    );

    let ctx = ApiContext {
        db,
        queue: Arc::new(queue),
        images: Arc::new(images),
        config: Arc::new(config),
    };

    Ok(create_api_router(ctx)
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http()))
}
