use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

/// Logs every request once, with the handler's `ApiError` when it left one in
/// the response extensions.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<Result<(), ApiError>>() {
        Some(Err(value)) => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Failed to process request"
        ),
        _ => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
    }

    response
}

#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Failed to create transaction")]
    TransactionCreationFailed,
    #[error("{0}")]
    General(String),
    #[error("Failed to generate token: {0}")]
    TokenGenerationFailed(String),
    #[error("Database error: {0}")]
    DbError(String),
    #[error("Failed to validate: {0}")]
    ValidationFail(String),
    #[error("Failed to enqueue job: {0}")]
    QueueError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub fn to_response<T: IntoResponse>(
    response: T,               //The response that we are sending + StatusCode
    ext: Result<(), ApiError>, //The extension, that we want to give logging middleware
) -> Response {
    let mut response = response.into_response();

    response.extensions_mut().insert(ext);

    response
}

pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    to_response((status, Json(json!({ "message": message.into() }))), Ok(()))
}

pub fn error_response(status: StatusCode, message: impl Into<String>, ext: ApiError) -> Response {
    to_response((status, Json(json!({ "error": message.into() }))), Err(ext))
}

pub fn internal_error(ext: ApiError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", ext)
}
