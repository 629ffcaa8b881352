//! Router for the counsel API

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    routing::any,
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::openai::Message;

type SharedState = Arc<AppState>;

/// Key used for rate limiting: the first address in the primary
/// header, else in the fallback header.
fn client_key(headers: &HeaderMap, primary: &str, fallback: &str) -> String {
    [primary, fallback]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Get the next counseling reply for a transcript.
///
/// Accepts any method so that rate limiting applies before the method
/// is checked.
async fn counsel_handler(
    State(state): State<SharedState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<public::CounselResponse>, ApiError> {
    let key = client_key(
        &headers,
        &state.config.client_ip_header,
        &state.config.client_ip_fallback_header,
    );
    if !state.limiter.check(&key).await.allowed {
        return Err(ApiError::RateLimited);
    }

    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let payload: public::CounselRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid request body: {}", e)))?;

    let transcript: Vec<Message> = payload
        .prompts
        .iter()
        .map(public::TranscriptEntry::to_message)
        .collect();
    // Run the turn on its own task so a client disconnect, which drops
    // this handler future, doesn't cancel completions already in flight
    let turn_state = Arc::clone(&state);
    let reply = tokio::spawn(async move { turn_state.counselor.respond(&transcript).await })
        .await
        .map_err(|e| ApiError::Upstream(e.into()))??;

    if !reply.retried.is_empty() {
        tracing::debug!("Reply needed {} corrective retries", reply.retried.len());
    }
    if reply.is_injection_flagged {
        return Err(ApiError::InjectionDetected);
    }

    let mut prompts = payload.prompts;
    prompts.push(reply.into_message().into());

    Ok(Json(public::CounselResponse { prompts }))
}

/// Create the counsel router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", any(counsel_handler))
}
