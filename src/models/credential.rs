use serde::{Deserialize, Serialize};

/// Base64 (de)serialization for binary record fields.
///
/// Salt, iv and ciphertext travel as standard base64 strings in JSON and
/// are stored as raw bytes everywhere else.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// The encrypted profile payload.
///
/// The iv is unique per encryption operation and the ciphertext is never
/// stored or transmitted without it; keeping both in one struct makes the
/// pairing structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// The initialization vector used for this encryption operation.
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    /// The opaque ciphertext (authentication tag appended).
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

/// One persisted credential record per student identity.
///
/// This is everything the server is allowed to hold: a one-way lookup
/// token, a verifier it can compare but not decrypt with, the record's
/// salt, and the opaque envelope. The plaintext password and profile never
/// appear on the server side of the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// The hashed identity used as the unique lookup key.
    pub identity_token: String,
    /// Confirms the client supplied the correct password; never usable to
    /// derive the encryption key.
    pub password_verifier: String,
    /// Random value generated once at record creation, fixed for the
    /// record's lifetime.
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// The encrypted profile payload.
    pub envelope: Envelope,
}
