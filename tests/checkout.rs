mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{spawn_app, ADMIN_EMAIL, APP_URL};

#[tokio::test]
async fn test_checkout_reserves_stock_and_sends_emails() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 99.5, &[("42", 3)]).await;

    let response = app.checkout(id, "42", 2).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"], 199.0);
    assert!(order["reference"].as_str().unwrap().starts_with("ORD-"));

    let product: Value = app
        .client
        .get(app.url(&format!("/api/product/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["stock"], 1);
    assert_eq!(product["sizes"][0]["quantity"], 1);

    app.wait_for_emails(2).await;
    let customer = app.mailer.sent_to("ada@example.com");
    assert_eq!(customer.len(), 1);
    assert!(customer[0].subject.contains("received"));
    assert_eq!(app.mailer.sent_to(ADMIN_EMAIL).len(), 1);
}

#[tokio::test]
async fn test_checkout_rejects_oversell() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 50.0, &[("42", 1)]).await;

    let response = app.checkout(id, "42", 2).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.checkout(id, "44", 1).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.checkout(id, "42", 1).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.checkout(id, "42", 1).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_validation_and_missing_product() {
    let app = spawn_app().await;

    let response = app.checkout(999, "42", 0).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.checkout(999, "42", 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_keeps_snapshot_after_product_edit_and_delete() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 99.5, &[("42", 3)]).await;

    let order: Value = app.checkout(id, "42", 1).await.json().await.unwrap();
    let order_id = order["id"].as_i64().unwrap();

    let response = app
        .client
        .patch(app.url(&format!("/api/admin/product/{id}")))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Road Runner",
            "price": 150.0,
            "image": "products/road.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/product/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

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
    assert_eq!(order["product_name"], "Trail Runner");
    assert_eq!(order["product_price"], 99.5);
    assert_eq!(order["product_image"], "products/trail.jpg");
    assert!(order["product_id"].is_null());
    assert_eq!(
        order["image_url"],
        format!("{APP_URL}/storage/products/trail.jpg")
    );
}
