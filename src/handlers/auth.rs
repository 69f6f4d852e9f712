use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};
use tower_cookies::cookie::time::Duration;

use crate::{
    crypto::identity,
    error::{AppError, Result},
    models::credential::CredentialRecord,
    services::auth as auth_service,
    services::session::SessionState,
    state::AppState,
    validation::auth::*,
};

/// The name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// The request payload for user login.
///
/// Clients normally send the precomputed identity token; `raw_identity` is
/// accepted as a fallback and hashed at the boundary, never stored.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub identity_token: Option<String>,
    pub raw_identity: Option<String>,
    pub verifier: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// The response payload for session-status requests.
#[derive(Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
}

/// Creates a secure cookie with the given name, value, and max age.
fn create_secure_cookie(name: String, value: String, max_age_minutes: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    let is_production = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "development".to_string()) == "production";

    cookie.set_http_only(true);

    if is_production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_minutes * 60));
    cookie.set_path("/");

    cookie
}

/// Resolves the identity token a login request addresses.
fn resolve_identity_token(payload: &LoginRequest) -> Result<String> {
    match (&payload.identity_token, &payload.raw_identity) {
        (Some(token), _) => {
            validate_identity_token(token)?;
            Ok(token.clone())
        }
        (None, Some(raw)) => {
            validate_raw_identity(raw)?;
            Ok(identity::identity_token(raw))
        }
        (None, None) => Err(AppError::Validation(
            "identity_token or raw_identity is required".to_string(),
        )),
    }
}

/// Handles credential record provisioning.
///
/// The record arrives fully formed: the client has already hashed the
/// identity, drawn the salt, computed the verifier, and sealed the
/// envelope. No plaintext crosses this boundary.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialRecord>,
) -> Result<Response> {
    validate_record(&payload)?;

    auth_service::provision(state.credentials.as_ref(), &payload).await?;

    let response = AuthResponse {
        success: true,
        message: "Registration successful".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
///
/// On success a session bound to the identity token is issued and set as a
/// cookie. On failure the response is a fixed 401 that does not reveal
/// whether the identity exists.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    validate_verifier(&payload.verifier)?;
    let identity_token = resolve_identity_token(&payload)?;

    let record =
        auth_service::login(state.credentials.as_ref(), &identity_token, &payload.verifier)
            .await?;

    let session_token = state.sessions.issue(record.identity_token).await?;

    let session_cookie = create_secure_cookie(
        SESSION_COOKIE.to_string(),
        session_token.to_string(),
        state.config.session_ttl_minutes,
    );
    cookies.add(session_cookie);

    tracing::info!("✅ Login succeeded, session issued");

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Reports whether the caller holds a valid session.
///
/// A pure query: a missing cookie, a stale session or an unreachable
/// session store all answer 401, never a crash.
#[axum::debug_handler]
pub async fn session_status(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response> {
    let token = crate::middleware_layer::auth::extract_session_token(&cookies)
        .ok_or(AppError::Unauthorized)?;

    match state.sessions.check(token).await {
        SessionState::Authenticated(_) => {
            Ok((StatusCode::OK, Json(SessionStatus { authenticated: true })).into_response())
        }
        SessionState::Unauthenticated => Err(AppError::Unauthorized),
    }
}

/// Handles logout.
///
/// Unconditional and idempotent: the session indicator is cleared and the
/// response is 200 whether or not a session existed.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response> {
    if let Some(token) = crate::middleware_layer::auth::extract_session_token(&cookies) {
        if let Err(e) = state.sessions.revoke(token).await {
            tracing::warn!("Session revocation failed: {}", e);
        } else {
            tracing::info!("👋 Session revoked");
        }
    }

    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
