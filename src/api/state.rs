use std::time::Duration;

use anyhow::Result;

use crate::core::AppConfig;
use crate::counsel::Counselor;
use crate::openai::{BoxedCompletionClient, OpenAiClient};
use crate::ratelimit::{BoxedRateLimiter, FixedWindowLimiter, Unlimited};

/// Everything a request needs, built once at startup and never
/// mutated afterwards.
pub struct AppState {
    pub config: AppConfig,
    pub counselor: Counselor,
    pub limiter: BoxedRateLimiter,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        client: BoxedCompletionClient,
        limiter: BoxedRateLimiter,
    ) -> Result<Self> {
        let counselor = Counselor::new(client, &config.system_message, config.max_turns)?;
        Ok(Self {
            config,
            counselor,
            limiter,
        })
    }

    /// State backed by the configured OpenAI compatible API and an
    /// in-process rate limiter.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.openai_model,
            config.max_output_tokens,
        );
        let limiter: BoxedRateLimiter = if config.rate_limit == 0 {
            Box::new(Unlimited)
        } else {
            Box::new(FixedWindowLimiter::new(
                config.rate_limit,
                Duration::from_secs(config.rate_limit_period_secs),
            ))
        };
        Self::new(config, Box::new(client), limiter)
    }
}
