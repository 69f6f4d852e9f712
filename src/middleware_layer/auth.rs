use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::AppError,
    handlers::auth::SESSION_COOKIE,
    services::session::SessionState,
    state::AppState,
};

/// Extracts the session token from the request cookies.
pub fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// A middleware that requires a valid session to be present.
///
/// On success the session is attached to the request extensions so gated
/// handlers know which identity the caller is bound to. Everything else —
/// no cookie, malformed token, unknown or expired session — is a uniform
/// 401.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(&cookies).ok_or_else(|| {
        tracing::debug!("No session cookie on gated request");
        AppError::Unauthorized
    })?;

    match state.sessions.check(token).await {
        SessionState::Authenticated(session) => {
            tracing::debug!("✅ Session valid for gated request");
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        SessionState::Unauthenticated => Err(AppError::Unauthorized),
    }
}
