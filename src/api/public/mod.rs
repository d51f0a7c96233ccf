pub mod auth;
pub mod category;
pub mod checkout;
pub mod product;
pub mod storage;

use axum::Router;

use super::ApiContext;
use auth::auth_router;
use category::category_router;
use checkout::checkout_router;
use product::product_router;

pub fn public_api_router(ctx: ApiContext) -> Router {
    Router::new()
        .merge(auth_router(ctx.clone()))
        .merge(category_router(ctx.clone()))
        .merge(product_router(ctx.clone()))
        .merge(checkout_router(ctx))
}
