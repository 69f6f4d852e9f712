use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::credential::CredentialRecord;
use crate::store::CredentialStore;

/// A well-formed verifier that matches no password. Compared against when
/// the identity is unknown, so the unknown-identity and wrong-password
/// paths do the same work and return the same error.
const DUMMY_VERIFIER: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Compares two encoded verifiers in constant time.
fn verifier_matches(supplied: &str, stored: &str) -> bool {
    supplied.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Confirms a supplied verifier against the stored credential record.
///
/// Fails with [`AppError::InvalidCredentials`] when the identity is unknown
/// or the verifier does not match; the two cases are indistinguishable to
/// the caller. On success the full record is returned so the login handler
/// can bind a session to its identity token.
pub async fn login(
    credentials: &dyn CredentialStore,
    identity_token: &str,
    supplied_verifier: &str,
) -> Result<CredentialRecord> {
    tracing::debug!("🔐 Login check for token: {}…", &identity_token[..8.min(identity_token.len())]);

    match credentials.get_by_token(identity_token).await? {
        Some(record) => {
            if !verifier_matches(supplied_verifier, &record.password_verifier) {
                return Err(AppError::InvalidCredentials);
            }
            Ok(record)
        }
        None => {
            // Burn the same comparison as the found path.
            let _ = verifier_matches(supplied_verifier, DUMMY_VERIFIER);
            Err(AppError::InvalidCredentials)
        }
    }
}

/// Provisions a new credential record.
///
/// The record arrives fully formed from the client; the server's part is
/// only the atomic put-if-absent.
pub async fn provision(
    credentials: &dyn CredentialStore,
    record: &CredentialRecord,
) -> Result<()> {
    credentials.put(record).await?;
    tracing::info!(
        "✅ Credential record provisioned: {}…",
        &record.identity_token[..8]
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::envelope;
    use crate::store::memory::MemoryCredentialStore;

    #[tokio::test]
    async fn login_accepts_the_right_verifier() {
        let store = MemoryCredentialStore::new();
        let record = envelope::enroll("alice", "p@ss", b"profile").unwrap();
        provision(&store, &record).await.unwrap();

        let found = login(&store, &record.identity_token, &record.password_verifier)
            .await
            .unwrap();
        assert_eq!(found.identity_token, record.identity_token);
    }

    #[tokio::test]
    async fn wrong_verifier_and_unknown_identity_are_indistinguishable() {
        let store = MemoryCredentialStore::new();
        let record = envelope::enroll("alice", "p@ss", b"profile").unwrap();
        provision(&store, &record).await.unwrap();

        let wrong = envelope::verifier_of("wrong", &record.salt).unwrap();
        let wrong_password = login(&store, &record.identity_token, &wrong).await;
        let unknown_identity = login(&store, &"0".repeat(64), &record.password_verifier).await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_identity, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn provisioning_twice_collides() {
        let store = MemoryCredentialStore::new();
        let record = envelope::enroll("alice", "p@ss", b"profile").unwrap();

        provision(&store, &record).await.unwrap();
        assert!(matches!(
            provision(&store, &record).await,
            Err(AppError::DuplicateIdentity)
        ));
    }
}
