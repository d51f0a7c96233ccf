use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::ApiContext;
use crate::config::AppConfig;
use crate::entities::user::{self, Entity as UserEntity};
use crate::middleware::auth::generate_token;
use crate::middleware::logging::{error_response, internal_error, to_response, ApiError};

pub fn auth_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/login", post(login))
        .layer(Extension(ctx.db))
        .layer(Extension(ctx.config))
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Json(payload): Json<UserLogin>,
) -> Response {
    let result = UserEntity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(&*db)
        .await;

    match result {
        Ok(Some(model)) => match model.check_hash(&payload.password) {
            Ok(()) => match generate_token(model.id, &config.secret) {
                Ok(token) => to_response((StatusCode::OK, Json(json!({ "token": token }))), Ok(())),
                Err(err) => internal_error(ApiError::TokenGenerationFailed(err.to_string())),
            },
            Err(err) => error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid username or password",
                ApiError::General(err),
            ),
        },
        Ok(None) => error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid username or password",
            ApiError::General(format!("Unknown user {}", payload.username)),
        ),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

#[derive(Deserialize)]
struct UserLogin {
    username: String,
    password: String,
}
