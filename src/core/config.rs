use std::env;
use std::str::FromStr;

use crate::ai::prompt::{Prompt, render};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub max_output_tokens: u32,
    pub max_turns: usize,
    pub system_message: String,
    /// Requests allowed per caller per period, `0` turns limiting off
    pub rate_limit: u32,
    pub rate_limit_period_secs: u64,
    pub client_ip_header: String,
    pub client_ip_fallback_header: String,
}

/// Read a numeric env var, falling back to `default` when it's
/// missing or doesn't parse.
fn env_number<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(val) => val.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using {}", name, val, default);
            default
        }),
        Err(_) => default,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let openai_api_hostname = env::var("COUNSEL_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model =
            env::var("COUNSEL_LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let max_output_tokens = env_number("COUNSEL_MAX_TOKENS", 150);
        let max_turns = env_number("COUNSEL_MAX_TURNS", 15);
        let system_message = env::var("COUNSEL_SYSTEM_MESSAGE").unwrap_or_else(|_| {
            render(Prompt::Counselor).expect("Failed to render counselor prompt")
        });
        let rate_limit = env_number("COUNSEL_RATE_LIMIT", 10);
        let rate_limit_period_secs = env_number("COUNSEL_RATE_LIMIT_PERIOD_SECS", 60);
        let client_ip_header =
            env::var("COUNSEL_IP_HEADER").unwrap_or_else(|_| "CF-Connecting-IP".to_string());
        let client_ip_fallback_header = env::var("COUNSEL_IP_FALLBACK_HEADER")
            .unwrap_or_else(|_| "X-Forwarded-For".to_string());

        Self {
            openai_model,
            openai_api_hostname,
            openai_api_key,
            max_output_tokens,
            max_turns,
            system_message,
            rate_limit,
            rate_limit_period_secs,
            client_ip_header,
            client_ip_fallback_header,
        }
    }
}
