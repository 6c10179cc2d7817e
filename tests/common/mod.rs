#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::Value;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// In-process stand-in for an Ollama server.
#[derive(Clone)]
pub struct FakeOllama {
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Duration,
    pub seen: Arc<Mutex<Vec<Value>>>,
}

impl FakeOllama {
    pub fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }

    /// Serves on a random local port and returns the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/generate", post(generate))
            .route("/api/tags", get(tags))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }
}

async fn generate(State(fake): State<FakeOllama>, Json(payload): Json<Value>) -> impl IntoResponse {
    fake.seen.lock().unwrap().push(payload);
    if !fake.delay.is_zero() {
        tokio::time::sleep(fake.delay).await;
    }
    (
        fake.status,
        [(header::CONTENT_TYPE, "application/json")],
        fake.body,
    )
}

async fn tags(State(fake): State<FakeOllama>) -> impl IntoResponse {
    (
        fake.status,
        [(header::CONTENT_TYPE, "application/json")],
        fake.body,
    )
}

/// An address nothing is listening on.
pub async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
