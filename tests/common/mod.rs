#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use shoe_shop::config::{AppConfig, MailConfig, MailDriver};
use shoe_shop::mail::{EmailMessage, MailError, Mailer};
use shoe_shop::queue::RetryPolicy;
use shoe_shop::{build_app, connect};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Muzion15";
pub const ADMIN_EMAIL: &str = "ops@shop.test";
pub const APP_URL: &str = "https://shop.test";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|message| message.to == to)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
    pub storage_dir: PathBuf,
}

pub async fn spawn_app() -> TestApp {
    let storage_dir = std::env::temp_dir().join(format!("shoe-shop-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&storage_dir).expect("Failed to create storage dir");

    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        app_url: APP_URL.to_string(),
        secret: "test-secret".to_string(),
        storage_dir: storage_dir.clone(),
        file_size_limit: 1024 * 1024,
        admin_username: ADMIN_USERNAME.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        mail: MailConfig {
            driver: MailDriver::Log,
            from: "shop@shop.test".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_starttls: true,
        },
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        },
    };

    let mailer = Arc::new(RecordingMailer::default());
    let db = connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    let app = build_app(config, db, mailer.clone())
        .await
        .expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: Client::new(),
        mailer,
        storage_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self) -> String {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.expect("Failed to parse response JSON");
        body["token"].as_str().expect("token in body").to_string()
    }

    /// Creates an available product with the given sizes and returns its id.
    pub async fn create_product(&self, token: &str, price: f64, sizes: &[(&str, i32)]) -> i64 {
        let response = self
            .client
            .post(self.url("/api/admin/product"))
            .bearer_auth(token)
            .json(&json!({
                "name": "Trail Runner",
                "description": "Grippy trail shoe",
                "price": price,
                "image": "products/trail.jpg",
                "gender": "unisex"
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        let id = body["id"].as_i64().expect("product id");

        let sizes: Vec<Value> = sizes
            .iter()
            .map(|(size, quantity)| json!({ "size": size, "quantity": quantity }))
            .collect();
        let response = self
            .client
            .put(self.url(&format!("/api/admin/product/{id}/sizes")))
            .bearer_auth(token)
            .json(&json!({ "sizes": sizes }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK);

        id
    }

    pub async fn checkout(&self, product_id: i64, size: &str, quantity: i32) -> reqwest::Response {
        self.client
            .post(self.url("/api/checkout"))
            .json(&json!({
                "product_id": product_id,
                "size": size,
                "quantity": quantity,
                "customer_name": "Ada Lovelace",
                "customer_email": "Ada@Example.com",
                "customer_phone": "+3725551234",
                "shipping_address": "Main street 1",
                "city": "Tallinn",
                "postal_code": "10111"
            }))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Waits for the background queue to deliver at least `count` emails.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let sent = self.mailer.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "Expected {count} emails, got {}",
            self.mailer.sent().len()
        );
    }
}
