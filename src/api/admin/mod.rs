pub mod campaign;
pub mod category;
pub mod order;
pub mod product;
pub mod upload;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use super::ApiContext;
use crate::middleware::auth::{auth_middleware, AuthState};
use campaign::admin_campaign_router;
use category::admin_category_router;
use order::admin_order_router;
use product::admin_product_router;
use upload::upload_router;

pub fn admin_api_router(ctx: ApiContext) -> Router {
    let auth_state = AuthState {
        db: ctx.db.clone(),
        secret: Arc::new(ctx.config.secret.clone()),
    };

    Router::new()
        .merge(admin_category_router(ctx.clone()))
        .merge(admin_product_router(ctx.clone()))
        .merge(admin_campaign_router(ctx.clone()))
        .merge(admin_order_router(ctx.clone()))
        .merge(upload_router(ctx))
        .layer(from_fn_with_state(auth_state, auth_middleware))
}
