//! Common test utilities for integration tests
//!
//! Every test gets a fresh router over an in-memory store and a mailer that
//! records instead of sending, so no database or SMTP server is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sprintboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, AppConfig, Config, DatabaseConfig, JwtConfig},
};
use sprintboard_shared::{
    auth::jwt,
    mail::{EmailMessage, MailError, Mailer},
    models::user::{CreateUser, User},
    store::{MemoryStore, Store},
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const APP_URL: &str = "https://app.sprintboard.test";

/// Keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    /// Records each attempt, then reports a delivery failure
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: AtomicBool::new(true),
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Waits for spawned sends to land
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..50 {
            let sent = self.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent().await
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.sent.lock().await.push(message.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Send("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        app: AppConfig {
            url: APP_URL.to_string(),
            mail_from: "Sprintboard <noreply@sprintboard.test>".to_string(),
        },
    }
}

/// Test context: the router plus handles on its store and mailer
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

/// A seeded account and an access token for it
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(mailer);
        let state = AppState::new(store.clone(), mailer.clone(), test_config());

        Self {
            app: build_router(state),
            store,
            mailer,
        }
    }

    /// Creates a registered user directly in the store
    pub async fn seed_user(&self, email: &str, name: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: Some("not-a-real-hash".to_string()),
                name: Some(name.to_string()),
                image: None,
            })
            .await
            .unwrap();

        let token = jwt::issue_token_pair(user.id, &user.email, JWT_SECRET)
            .unwrap()
            .access_token;

        TestUser { user, token }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        send(&self.app, request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> String {
        let (status, body) = self
            .post("/v1/projects", &owner.token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Invites `email` with `role` and returns the membership id
    pub async fn invite(&self, project_id: &str, by: &TestUser, email: &str, role: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/v1/projects/{}/members", project_id),
                &by.token,
                serde_json::json!({ "email": email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

/// Sends a raw request and decodes the JSON body (`Null` when empty)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}
