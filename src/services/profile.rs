use crate::error::{AppError, Result};
use crate::models::credential::CredentialRecord;
use crate::models::session::Session;
use crate::store::CredentialStore;

/// Returns the stored record for `requested_token` to its owner.
///
/// The session must be bound to the requested identity: a session for
/// identity A cannot fetch identity B's record. On success the caller gets
/// exactly the fields the client needs to re-derive its key and decrypt
/// the envelope — token, verifier, salt, envelope. Nothing here derives,
/// decrypts or logs plaintext; a leak at this boundary would defeat the
/// whole design.
pub async fn get_envelope(
    credentials: &dyn CredentialStore,
    session: &Session,
    requested_token: &str,
) -> Result<CredentialRecord> {
    if session.identity_token != requested_token {
        tracing::warn!("Cross-identity profile fetch rejected");
        return Err(AppError::Unauthorized);
    }

    credentials
        .get_by_token(requested_token)
        .await?
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::crypto::envelope;
    use crate::store::memory::MemoryCredentialStore;

    fn session_for(identity_token: &str) -> Session {
        let now = Utc::now();
        Session {
            identity_token: identity_token.to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn owner_gets_the_full_record() {
        let store = MemoryCredentialStore::new();
        let record = envelope::enroll("alice", "p@ss", b"profile").unwrap();
        store.put(&record).await.unwrap();

        let fetched = get_envelope(&store, &session_for(&record.identity_token), &record.identity_token)
            .await
            .unwrap();

        assert_eq!(fetched.password_verifier, record.password_verifier);
        assert_eq!(fetched.salt, record.salt);
        assert_eq!(fetched.envelope, record.envelope);
    }

    #[tokio::test]
    async fn cross_identity_fetch_is_unauthorized() {
        let store = MemoryCredentialStore::new();
        let alice = envelope::enroll("alice", "p@ss", b"profile").unwrap();
        let bob = envelope::enroll("bob", "hunter2!", b"profile").unwrap();
        store.put(&alice).await.unwrap();
        store.put(&bob).await.unwrap();

        let result = get_envelope(&store, &session_for(&alice.identity_token), &bob.identity_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = MemoryCredentialStore::new();
        let token = "0".repeat(64);

        let result = get_envelope(&store, &session_for(&token), &token).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
