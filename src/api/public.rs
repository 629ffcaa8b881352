//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::ai::prompt::FORCED_TERMINATION;
use crate::counsel::CounselError;
use crate::openai::{Message, Role};

// Errors

/// Every way a request can end other than a normal reply.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Your IP has been rate limited.")]
    RateLimited,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Conversation has {turns} messages which exceeds the maximum of {max}")]
    ConversationTooLong { turns: usize, max: usize },

    #[error("Prompt injection detected")]
    InjectionDetected,

    #[error("{0}")]
    Upstream(anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidRequest(_)
            | Self::ConversationTooLong { .. }
            | Self::InjectionDetected => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CounselError> for ApiError {
    fn from(err: CounselError) -> Self {
        match err {
            CounselError::ConversationTooLong { turns, max } => {
                Self::ConversationTooLong { turns, max }
            }
            CounselError::Upstream(e) => Self::Upstream(e),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response. Forced
/// terminations answer with a single synthetic assistant message,
/// everything else with `{message, code}`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Upstream(e) => {
                tracing::error!("Completion failed: {}. Root cause: {}", e, e.root_cause())
            }
            Self::InjectionDetected => tracing::warn!("Terminating conversation: {}", self),
            _ => tracing::info!("Rejecting request: {}", self),
        }

        match self {
            Self::ConversationTooLong { .. } | Self::InjectionDetected => {
                let terminated = Message::new(Role::Assistant, FORCED_TERMINATION);
                let body = self::counsel::CounselResponse {
                    prompts: vec![terminated.into()],
                };
                (status, Json(body)).into_response()
            }
            _ => {
                let body = ErrorResponse {
                    message: self.to_string(),
                    code: status.as_u16(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

pub use self::counsel::ErrorResponse;

// Re-export public types from each route

pub mod counsel {
    pub use crate::api::routes::counsel::public::*;
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::ConversationTooLong { turns: 16, max: 15 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InjectionDetected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Upstream(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_message_is_surfaced_verbatim() {
        let err = ApiError::from(CounselError::Upstream(anyhow!("You exceeded your current quota")));
        assert_eq!(err.to_string(), "You exceeded your current quota");
    }
}
