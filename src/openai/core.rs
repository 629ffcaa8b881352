use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

/// A single turn in a conversation. Only `role` and `content` are
/// ever sent upstream.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Anything that can produce the next assistant message for a list
/// of messages. The HTTP handler and the CLI only ever talk to this
/// trait so the upstream can be swapped out in tests.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<Message, Error>;
}

pub type BoxedCompletionClient = Box<dyn CompletionClient + Send + Sync + 'static>;

/// Client for an OpenAI compatible chat completions API.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    api_hostname: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<Message, Error> {
        let resp = completion(
            messages,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.max_tokens,
        )
        .await?;
        first_choice_message(&resp)
    }
}

pub async fn completion(
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
    max_tokens: u32,
) -> Result<Value, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "max_tokens": max_tokens,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 2))
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    // OpenAI reports failures as `{"error": {"message": ...}}` and
    // that description is what the caller should see. Proxies in front
    // of it may answer with anything, e.g. an HTML 502 page.
    if !status.is_success() {
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        match body["error"]["message"].as_str() {
            Some(msg) => bail!("{}", msg),
            None => bail!("Completion request failed with status {}", status),
        }
    }

    let body = serde_json::from_str(&text)?;
    Ok(body)
}

/// Pull the assistant message out of a chat completion response.
fn first_choice_message(resp: &Value) -> Result<Message, Error> {
    let message = &resp["choices"][0]["message"];
    let content = message["content"]
        .as_str()
        .ok_or(anyhow!("No message received. Resp: {}", resp))?;
    let role = match message["role"].as_str() {
        Some(role) => serde_json::from_value(json!(role))?,
        None => Role::Assistant,
    };

    Ok(Message::new(role, content))
}
