use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use std::path::{Component, PathBuf};
use tokio_util::io::ReaderStream;

use crate::middleware::logging::{error_response, to_response, ApiError};

/// Serves the public storage root, the same tree `ImageUrlNormalizer` points
/// bare image paths at.
pub fn storage_router(storage_dir: PathBuf) -> Router {
    Router::new()
        .route("/storage/*path", get(serve_file))
        .layer(Extension(StorageRoot(storage_dir)))
}

#[derive(Clone)]
struct StorageRoot(PathBuf);

async fn serve_file(
    Path(path): Path<String>,
    Extension(StorageRoot(root)): Extension<StorageRoot>,
) -> Response {
    let Some(full_path) = resolve(&root, &path) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "Not found",
            ApiError::StorageError(format!("Rejected storage path {path}")),
        );
    };

    let file = match tokio::fs::File::open(&full_path).await {
        Ok(file) => file,
        Err(err) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "Not found",
                ApiError::StorageError(err.to_string()),
            )
        }
    };

    let content_type = mime_guess::from_path(&full_path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    to_response((headers, body), Ok(()))
}

/// Only plain relative segments are allowed below the storage root.
fn resolve(root: &std::path::Path, requested: &str) -> Option<PathBuf> {
    let relative = std::path::Path::new(requested);
    if requested.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }

    Some(root.join(relative))
}
