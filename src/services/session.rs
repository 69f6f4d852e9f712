use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::session::Session;
use crate::store::SessionStore;

/// The answer to a session query.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// A valid, non-expired session is present.
    Authenticated(Session),
    /// Anything else: no token, unknown token, expired session, or a
    /// store that could not answer.
    Unauthenticated,
}

impl SessionState {
    /// Returns `true` for the authenticated state.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Issues, validates and revokes session tokens bound to an identity.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl_minutes: i64,
}

impl SessionManager {
    /// Creates a new `SessionManager` on top of a session store.
    pub fn new(store: Arc<dyn SessionStore>, ttl_minutes: i64) -> Self {
        Self { store, ttl_minutes }
    }

    /// Issues a fresh session bound to `identity_token`.
    ///
    /// Only the session store is mutated; credential records are never
    /// touched by session lifecycle operations.
    pub async fn issue(&self, identity_token: String) -> Result<Uuid> {
        let token = Uuid::new_v4();
        let now = Utc::now();
        let session = Session {
            identity_token,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(self.ttl_minutes),
        };

        let ttl = Duration::from_secs((self.ttl_minutes * 60) as u64);
        self.store.put(token, &session, ttl).await?;

        tracing::debug!("🔑 Session issued: {}", token);
        Ok(token)
    }

    /// Reports whether `token` names a valid, non-expired session.
    ///
    /// This is a pure query: it never fails. Store errors and malformed or
    /// expired sessions all report `Unauthenticated`; expired entries are
    /// deleted on sight.
    pub async fn check(&self, token: Uuid) -> SessionState {
        let session = match self.store.get(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return SessionState::Unauthenticated,
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                return SessionState::Unauthenticated;
            }
        };

        if session.is_expired() {
            tracing::debug!("Session expired: {}", token);
            if let Err(e) = self.store.delete(token).await {
                tracing::warn!("Expired session cleanup failed: {}", e);
            }
            return SessionState::Unauthenticated;
        }

        SessionState::Authenticated(session)
    }

    /// Revokes the session for `token`.
    ///
    /// Idempotent: revoking an absent or already-revoked token succeeds.
    pub async fn revoke(&self, token: Uuid) -> Result<()> {
        self.store.delete(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySessionStore;

    fn manager(ttl_minutes: i64) -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::new()), ttl_minutes)
    }

    #[tokio::test]
    async fn issue_then_check_reports_authenticated() {
        let sessions = manager(30);
        let token = sessions.issue("t".repeat(64)).await.unwrap();

        match sessions.check(token).await {
            SessionState::Authenticated(session) => {
                assert_eq!(session.identity_token, "t".repeat(64));
            }
            SessionState::Unauthenticated => panic!("expected an authenticated session"),
        }
    }

    #[tokio::test]
    async fn unknown_token_is_unauthenticated() {
        let sessions = manager(30);
        assert!(!sessions.check(Uuid::new_v4()).await.is_authenticated());
    }

    #[tokio::test]
    async fn revoke_ends_the_session_and_is_idempotent() {
        let sessions = manager(30);
        let token = sessions.issue("t".repeat(64)).await.unwrap();

        sessions.revoke(token).await.unwrap();
        assert!(!sessions.check(token).await.is_authenticated());

        // Revoking again is not an error.
        sessions.revoke(token).await.unwrap();
    }

    #[tokio::test]
    async fn stale_sessions_are_rejected() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = SessionManager::new(store.clone(), 30);
        let token = Uuid::new_v4();

        let now = Utc::now();
        let stale = Session {
            identity_token: "t".repeat(64),
            created_at: now - chrono::Duration::minutes(90),
            expires_at: now - chrono::Duration::minutes(60),
        };
        store
            .put(token, &stale, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(!sessions.check(token).await.is_authenticated());
        // The stale entry is gone after the failed check.
        assert!(store.get(token).await.unwrap().is_none());
    }
}
