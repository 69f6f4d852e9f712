use crate::crypto::aes::IV_SIZE;
use crate::crypto::envelope::{SALT_SIZE, VERIFIER_SIZE};
use crate::crypto::identity;
use crate::error::{AppError, Result};
use crate::models::credential::CredentialRecord;

/// The minimum ciphertext length: an AES-GCM tag alone is 16 bytes.
const MIN_CIPHERTEXT_SIZE: usize = 16;

/// Validates a raw identity (username) before hashing.
pub fn validate_raw_identity(raw_identity: &str) -> Result<()> {
    if raw_identity.len() < 3 {
        return Err(AppError::Validation(
            "Identity must be at least 3 characters long".to_string(),
        ));
    }

    if raw_identity.len() > 255 {
        return Err(AppError::Validation(
            "Identity must be at most 255 characters".to_string(),
        ));
    }

    if !raw_identity
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(AppError::Validation(
            "Identity can only contain letters, numbers, underscores, hyphens, and dots"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validates an identity token's shape.
pub fn validate_identity_token(token: &str) -> Result<()> {
    if !identity::is_valid_token(token) {
        return Err(AppError::Validation(
            "Identity token must be 64 lowercase hex characters".to_string(),
        ));
    }
    Ok(())
}

/// Validates a password verifier's shape.
pub fn validate_verifier(verifier: &str) -> Result<()> {
    if verifier.len() != VERIFIER_SIZE
        || !verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(AppError::Validation(
            "Malformed password verifier".to_string(),
        ));
    }
    Ok(())
}

/// Validates a complete credential record before provisioning.
pub fn validate_record(record: &CredentialRecord) -> Result<()> {
    validate_identity_token(&record.identity_token)?;
    validate_verifier(&record.password_verifier)?;

    if record.salt.len() != SALT_SIZE {
        return Err(AppError::Validation(format!(
            "Salt must be exactly {} bytes",
            SALT_SIZE
        )));
    }

    if record.envelope.iv.len() != IV_SIZE {
        return Err(AppError::Validation(format!(
            "Envelope iv must be exactly {} bytes",
            IV_SIZE
        )));
    }

    if record.envelope.ciphertext.len() < MIN_CIPHERTEXT_SIZE {
        return Err(AppError::Validation(
            "Envelope ciphertext is too short".to_string(),
        ));
    }

    Ok(())
}
