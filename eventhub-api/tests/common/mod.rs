//! Common test utilities for integration tests
//!
//! Each test gets its own router over a fresh in-memory store, so tests can
//! run in parallel without a database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use eventhub_api::app::{build_router, AppState};
use eventhub_api::config::Config;
use eventhub_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the router and its store
pub struct TestContext {
    pub app: Router,
    pub store: MemoryStore,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration");

        let store = MemoryStore::new();
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { app, store, config }
    }

    /// Sends a request and returns the status with the decoded JSON body
    /// (`Value::Null` for an empty body)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, value)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn guest_login(&self, email: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/auth/guest-login",
            None,
            Some(json!({ "email": email })),
        )
        .await
    }

    /// Registers a user and returns `(id, token)`
    pub async fn user(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self.register(name, email, "secret1").await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["user"]["_id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Creates an event as `token` and returns its JSON
    pub async fn event(&self, token: &str, max_attendees: Option<i32>) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/events",
                Some(token),
                Some(json!({
                    "title": "Rust meetup",
                    "description": "Talks and pizza",
                    "category": "Tech",
                    "date": "2026-11-05T18:00:00Z",
                    "location": "Library",
                    "maxAttendees": max_attendees,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["event"].clone()
    }
}
