mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{spawn_app, APP_URL};

#[tokio::test]
async fn test_product_listing_resolves_images_and_sizes() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 120.0, &[("42", 3), ("43", 2)]).await;

    let response = app
        .client
        .get(app.url(&format!("/api/product/{id}")))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["stock"], 5);
    assert_eq!(body["sizes"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["image_url"],
        format!("{APP_URL}/storage/products/trail.jpg")
    );
    assert_eq!(body["effective_price"], 120.0);
}

#[tokio::test]
async fn test_running_campaign_lowers_effective_price() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 120.0, &[("42", 3)]).await;

    let now = chrono::Utc::now();
    let response = app
        .client
        .post(app.url("/api/admin/campaign"))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": id,
            "name": "Spring sale",
            "discount_price": 89.9,
            "starts_at": now - chrono::Duration::hours(1),
            "ends_at": now + chrono::Duration::days(1)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = app
        .client
        .get(app.url(&format!("/api/product/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["price"], 120.0);
    assert_eq!(body["effective_price"], 89.9);
    assert_eq!(body["campaign"]["name"], "Spring sale");
}

#[tokio::test]
async fn test_category_filter_includes_children() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 80.0, &[("40", 1)]).await;

    let parent: Value = app
        .client
        .post(app.url("/api/admin/category"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Running" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parent["slug"], "running");

    let child: Value = app
        .client
        .post(app.url("/api/admin/category"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Trail", "parent_id": parent["id"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/admin/product/{id}/categories")))
        .bearer_auth(&token)
        .json(&json!({ "category_ids": [child["id"]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let products: Value = app
        .client
        .get(app.url("/api/product?category=running"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["id"], id);

    let category: Value = app
        .client
        .get(app.url("/api/category/running"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(category["children"][0]["slug"], "trail");
}

#[tokio::test]
async fn test_size_quantities_are_bounded() {
    let app = spawn_app().await;
    let token = app.login().await;
    let id = app.create_product(&token, 80.0, &[("40", 1)]).await;

    let response = app
        .client
        .put(app.url(&format!("/api/admin/product/{id}/sizes")))
        .bearer_auth(&token)
        .json(&json!({
            "sizes": [
                { "size": "42", "quantity": i32::MAX },
                { "size": "43", "quantity": 1 }
            ]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

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
}
