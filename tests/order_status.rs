mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use common::{spawn_app, TestApp, APP_URL};

async fn place_order(app: &TestApp, token: &str) -> i64 {
    let id = app.create_product(token, 99.5, &[("42", 3)]).await;
    let order: Value = app.checkout(id, "42", 1).await.json().await.unwrap();
    // Order confirmation and admin alert.
    app.wait_for_emails(2).await;
    app.mailer.clear();
    order["id"].as_i64().unwrap()
}

async fn set_status(app: &TestApp, token: &str, order_id: i64, status: &str) -> reqwest::Response {
    app.client
        .patch(app.url(&format!("/api/admin/order/{order_id}/status")))
        .bearer_auth(token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn test_status_change_notifies_customer_once() {
    let app = spawn_app().await;
    let token = app.login().await;
    let order_id = place_order(&app, &token).await;

    let response = set_status(&app, &token, order_id, "confirmed").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["transition"]["from"], "pending");
    assert_eq!(body["transition"]["to"], "confirmed");

    let sent = app.wait_for_emails(1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.mailer.sent().len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    assert!(sent[0].text_body.contains("Your order has been confirmed!"));
    assert!(sent[0]
        .html_body
        .contains(&format!("{APP_URL}/storage/products/trail.jpg")));
}

#[tokio::test]
async fn test_same_status_sends_nothing() {
    let app = spawn_app().await;
    let token = app.login().await;
    let order_id = place_order(&app, &token).await;

    let response = set_status(&app, &token, order_id, "pending").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["transition"].is_null());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_status_timestamps_and_unknown_order() {
    let app = spawn_app().await;
    let token = app.login().await;
    let order_id = place_order(&app, &token).await;

    set_status(&app, &token, order_id, "shipped").await;
    let order: Value = app
        .client
        .get(app.url(&format!("/api/admin/order/{order_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(order["status"], "shipped");
    assert!(order["shipped_at"].is_string());
    assert!(order["delivered_at"].is_null());
    assert_eq!(
        order["image_url"],
        format!("{APP_URL}/storage/products/trail.jpg")
    );

    let response = set_status(&app, &token, 9999, "confirmed").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = set_status(&app, &token, order_id, "lost").await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_order_listing_filters_by_status() {
    let app = spawn_app().await;
    let token = app.login().await;
    let order_id = place_order(&app, &token).await;

    let pending: Value = app
        .client
        .get(app.url("/api/admin/order?status=pending&search=ada"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], order_id);

    let shipped: Value = app
        .client
        .get(app.url("/api/admin/order?status=shipped"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(shipped.as_array().unwrap().is_empty());
}
