use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::{
    error::Result,
    models::session::Session,
    services::profile as profile_service,
    state::AppState,
    validation::auth::validate_identity_token,
};

/// Returns the caller's stored credential record.
///
/// Gated by the auth middleware; the session extension is only present for
/// a valid, non-expired session. The response carries the identity token,
/// verifier, salt and envelope — the client re-derives its key and
/// decrypts locally. The profile plaintext never exists on this side.
#[axum::debug_handler]
pub async fn fetch_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(identity_token): Path<String>,
) -> Result<Response> {
    validate_identity_token(&identity_token)?;

    let record =
        profile_service::get_envelope(state.credentials.as_ref(), &session, &identity_token)
            .await?;

    Ok((StatusCode::OK, Json(record)).into_response())
}
