use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sonic_rs::JsonValueTrait;

use crate::{crypto::identity, error::AppError, state::AppState};

/// The most a login body can reasonably be.
const MAX_LOGIN_BODY_BYTES: usize = 64 * 1024;

/// Pulls the identity token a login payload addresses, hashing
/// `raw_identity` when that is what the client sent.
fn extract_login_key(body_bytes: &[u8]) -> Option<String> {
    let json = sonic_rs::from_slice::<sonic_rs::Value>(body_bytes).ok()?;

    if let Some(token) = json.get("identity_token").and_then(|v| v.as_str()) {
        return Some(token.to_string());
    }

    json.get("raw_identity")
        .and_then(|v| v.as_str())
        .map(identity::identity_token)
}

/// A middleware that throttles login attempts per identity.
///
/// Failed attempts (401 responses) are counted inside a sliding window; a
/// successful login clears the count. Once over the limit the request is
/// answered 429 before any credential lookup happens.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_LOGIN_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation("Request body too large".to_string()).into_response();
        }
    };

    let key = extract_login_key(&body_bytes).unwrap_or_else(|| "unknown".to_string());

    if !state.throttle.allow(&key).await {
        return AppError::RateLimited.into_response();
    }

    let req = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(req).await;

    if response.status() == axum::http::StatusCode::UNAUTHORIZED {
        state.throttle.record_failure(&key).await;
    } else if response.status().is_success() {
        state.throttle.clear(&key).await;
    }

    response
}
