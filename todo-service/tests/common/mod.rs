#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use todo_service::config::{BulkReplaceConfig, CorsConfig, MongoConfig, TodoConfig, SERVICE_NAME};
use todo_service::services::MockTodoStore;
use todo_service::{build_router, AppState, Application};
use tower::util::ServiceExt;
use uuid::Uuid;

/// Router over a fresh in-memory store.
pub fn mock_app() -> (Router, Arc<MockTodoStore>) {
    let store = Arc::new(MockTodoStore::new());
    let router = build_router(AppState::new(store.clone()));
    (router, store)
}

/// Sends one request through the router and returns status plus parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub fn test_config(uri: &str, db_name: &str) -> TodoConfig {
    TodoConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            ..CoreConfig::default()
        },
        mongodb: MongoConfig {
            uri: Some(Secret::new(uri.to_string())),
            database: Some(db_name.to_string()),
            app_name: SERVICE_NAME.to_string(),
        },
        bulk_replace: BulkReplaceConfig::default(),
        cors: CorsConfig::default(),
    }
}

/// A running service against a real MongoDB with its own throwaway database.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: mongodb::Client,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uri = std::env::var("TEST_MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = format!("todo_test_{}", Uuid::new_v4());

        let app = Application::build(test_config(&uri, &db_name))
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let http = reqwest::Client::new();
        for _ in 0..50 {
            if http.get(format!("{}/ready", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        let client = mongodb::Client::with_uri_str(&uri)
            .await
            .expect("Failed to connect to MongoDB");

        TestApp {
            address,
            port,
            client,
            db_name,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Drop the test database.
    pub async fn cleanup(&self) {
        let _ = self.client.database(&self.db_name).drop(None).await;
    }
}
