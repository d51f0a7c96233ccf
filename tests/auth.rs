mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{spawn_app, ADMIN_USERNAME};

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success(), "Health check failed");
}

#[tokio::test]
async fn test_login() {
    let app = spawn_app().await;

    let token = app.login().await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = spawn_app().await;

    for path in ["/api/admin/order", "/api/admin/category", "/api/admin/image"] {
        let response = app
            .client
            .get(app.url(path))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let response = app
        .client
        .get(app.url("/api/admin/order"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
