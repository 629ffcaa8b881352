//! Test utilities for integration tests
#![allow(dead_code)]
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Error, anyhow};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use counsel::api::{AppState, app};
use counsel::core::AppConfig;
use counsel::openai::{BoxedCompletionClient, CompletionClient, Message, Role};
use counsel::ratelimit::{BoxedRateLimiter, Unlimited};

pub const SYSTEM_MESSAGE: &str = "You are 육은영, a counseling chatbot.";

/// Completion client that answers from a fixed script and records
/// every message list it receives.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedClient {
    pub fn new(replies: &[&str]) -> Self {
        let client = Self::default();
        for r in replies {
            client.replies.lock().unwrap().push_back(Ok(r.to_string()));
        }
        client
    }

    pub fn failing(msg: &str) -> Self {
        let client = Self::default();
        client.replies.lock().unwrap().push_back(Err(msg.to_string()));
        client
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, messages: &[Message]) -> Result<Message, Error> {
        self.calls.lock().unwrap().push(messages.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(Message::new(Role::Assistant, &content)),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("script exhausted")),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        openai_model: String::from("gpt-3.5-turbo"),
        openai_api_hostname: String::from("https://api.openai.com"),
        openai_api_key: String::from("test-api-key"),
        max_output_tokens: 150,
        max_turns: 15,
        system_message: String::from(SYSTEM_MESSAGE),
        rate_limit: 0,
        rate_limit_period_secs: 60,
        client_ip_header: String::from("CF-Connecting-IP"),
        client_ip_fallback_header: String::from("X-Forwarded-For"),
    }
}

/// Creates a test application router backed by `client` with the
/// given rate limiter.
pub fn test_app_with(client: BoxedCompletionClient, limiter: BoxedRateLimiter) -> Router {
    let app_state =
        AppState::new(test_config(), client, limiter).expect("Failed to build app state");
    app(Arc::new(app_state))
}

/// Creates a test application router without rate limiting.
pub fn test_app(client: &ScriptedClient) -> Router {
    test_app_with(Box::new(client.clone()), Box::new(Unlimited))
}

pub fn counsel_request(method: &str, body: Value, ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/counsel")
        .method(method)
        .header("content-type", "application/json")
        .header("cf-connecting-ip", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request and return the status and parsed JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
