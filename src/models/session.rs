use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an authenticated session.
///
/// A session is bound to exactly one identity token and carries an
/// explicit expiry; a session with no expiry cannot exist in this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The identity token this session is bound to.
    pub identity_token: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` once the session's expiry has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
