//! Key derivation and envelope cipher.
//!
//! Everything in this module runs on the trusted client. The server stores
//! and returns what these functions produce, but it never calls them with a
//! live password: a correct deployment keeps `derive_key`'s output off the
//! server for the lifetime of every record.

use argon2::{Algorithm, Argon2, ParamsBuilder, Version};
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::crypto::aes::{self, SecureKey, IV_SIZE, KEY_SIZE};
use crate::crypto::identity;
use crate::error::{AppError, Result};
use crate::models::credential::{CredentialRecord, Envelope};

/// The size of a per-record salt in bytes.
pub const SALT_SIZE: usize = 16;
/// The width of an encoded password verifier in characters.
pub const VERIFIER_SIZE: usize = 43;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// The stretched output is split in two labeled halves: the first becomes
/// the encryption key, the second feeds the verifier. Neither half is
/// computable from the other, so a server holding the verifier (and the
/// salt) still cannot decrypt the envelope.
const STRETCH_SIZE: usize = 2 * KEY_SIZE;

/// Domain-separation tag for the verifier half of the stretch.
const VERIFIER_TAG: &[u8] = b"planvault/profile-verifier/v1";

/// Runs the slow password stretch shared by `derive_key` and `verifier_of`.
fn stretch(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; STRETCH_SIZE]>> {
    if salt.len() != SALT_SIZE {
        return Err(AppError::Encryption(format!(
            "Salt must be {} bytes, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }

    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .output_len(STRETCH_SIZE)
            .build()
            .map_err(|e| AppError::Encryption(format!("Argon2 params: {}", e)))?,
    );

    let mut out = Zeroizing::new([0u8; STRETCH_SIZE]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut out[..])
        .map_err(|e| AppError::Encryption(format!("Argon2 derivation error: {}", e)))?;

    Ok(out)
}

/// Generates a fresh per-record salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derives the envelope encryption key from a password and salt.
///
/// Deterministic for a given `(password, salt)` pair. The key is the first
/// half of the Argon2id stretch and never leaves the client.
pub fn derive_key(password: &str, salt: &[u8]) -> Result<SecureKey> {
    let stretched = stretch(password, salt)?;
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&stretched[..KEY_SIZE]);
    Ok(SecureKey::new(key))
}

/// Computes the password verifier for a password and salt.
///
/// The verifier is a tagged SHA-256 of the second half of the stretch,
/// encoded as url-safe base64. It confirms possession of the password
/// without being usable as the encryption key.
pub fn verifier_of(password: &str, salt: &[u8]) -> Result<String> {
    let stretched = stretch(password, salt)?;

    let mut hasher = Sha256::new();
    hasher.update(VERIFIER_TAG);
    hasher.update(&stretched[KEY_SIZE..]);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

/// Encrypts a profile payload into an envelope with a fresh iv.
pub fn seal(key: &SecureKey, plaintext: &[u8]) -> Result<Envelope> {
    let (ciphertext, iv) = aes::encrypt(key.as_bytes(), plaintext)?;
    Ok(Envelope {
        iv: iv.to_vec(),
        ciphertext,
    })
}

/// Decrypts an envelope.
///
/// Fails with [`AppError::AuthenticationFailed`] when the key is wrong or
/// the envelope has been tampered with.
pub fn open(key: &SecureKey, envelope: &Envelope) -> Result<Vec<u8>> {
    let iv: [u8; IV_SIZE] = envelope
        .iv
        .as_slice()
        .try_into()
        .map_err(|_| AppError::AuthenticationFailed)?;

    aes::decrypt(key.as_bytes(), &envelope.ciphertext, &iv)
}

/// Prepares a complete credential record for a new identity.
///
/// This is the client side of provisioning: hash the identity, draw a
/// salt, derive the verifier, and seal the profile. The output is exactly
/// what the server is allowed to see.
pub fn enroll(raw_identity: &str, password: &str, profile: &[u8]) -> Result<CredentialRecord> {
    let salt = generate_salt();
    let key = derive_key(password, &salt)?;

    Ok(CredentialRecord {
        identity_token: identity::identity_token(raw_identity),
        password_verifier: verifier_of(password, &salt)?,
        salt: salt.to_vec(),
        envelope: seal(&key, profile)?,
    })
}

/// Recovers a profile payload from a fetched record's salt and envelope.
pub fn recover(password: &str, salt: &[u8], envelope: &Envelope) -> Result<Vec<u8>> {
    let key = derive_key(password, salt)?;
    open(&key, envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_and_verifier_are_separated() {
        let salt = generate_salt();
        let key = derive_key("p@ss", &salt).unwrap();
        let verifier = verifier_of("p@ss", &salt).unwrap();

        assert_eq!(verifier.len(), VERIFIER_SIZE);
        let verifier_bytes = general_purpose::URL_SAFE_NO_PAD.decode(&verifier).unwrap();
        assert_ne!(key.as_bytes().as_slice(), verifier_bytes.as_slice());
    }

    #[test]
    fn derivations_are_deterministic() {
        let salt = generate_salt();
        assert_eq!(
            derive_key("p@ss", &salt).unwrap().as_bytes(),
            derive_key("p@ss", &salt).unwrap().as_bytes()
        );
        assert_eq!(
            verifier_of("p@ss", &salt).unwrap(),
            verifier_of("p@ss", &salt).unwrap()
        );
    }

    #[test]
    fn envelope_round_trip() {
        let salt = generate_salt();
        let key = derive_key("p@ss", &salt).unwrap();

        let envelope = seal(&key, br#"{"name":"Alice"}"#).unwrap();
        assert_eq!(envelope.iv.len(), IV_SIZE);
        assert_eq!(open(&key, &envelope).unwrap(), br#"{"name":"Alice"}"#);
    }

    #[test]
    fn flipped_ciphertext_bit_fails_closed() {
        let salt = generate_salt();
        let key = derive_key("p@ss", &salt).unwrap();

        let mut envelope = seal(&key, b"profile payload").unwrap();
        envelope.ciphertext[0] ^= 1;
        assert!(matches!(
            open(&key, &envelope),
            Err(AppError::AuthenticationFailed)
        ));
    }

    #[test]
    fn flipped_iv_bit_fails_closed() {
        let salt = generate_salt();
        let key = derive_key("p@ss", &salt).unwrap();

        let mut envelope = seal(&key, b"profile payload").unwrap();
        envelope.iv[0] ^= 1;
        assert!(matches!(
            open(&key, &envelope),
            Err(AppError::AuthenticationFailed)
        ));
    }

    #[test]
    fn wrong_password_fails_closed() {
        let salt = generate_salt();
        let key = derive_key("p@ss", &salt).unwrap();
        let envelope = seal(&key, b"profile payload").unwrap();

        assert!(matches!(
            recover("wrong", &salt, &envelope),
            Err(AppError::AuthenticationFailed)
        ));
    }

    #[test]
    fn enroll_then_recover() {
        let record = enroll("alice", "p@ss", br#"{"name":"Alice"}"#).unwrap();

        assert_eq!(record.identity_token, identity::identity_token("alice"));
        assert_eq!(
            record.password_verifier,
            verifier_of("p@ss", &record.salt).unwrap()
        );
        assert_eq!(
            recover("p@ss", &record.salt, &record.envelope).unwrap(),
            br#"{"name":"Alice"}"#
        );
    }
}
