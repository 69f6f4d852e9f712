use sha2::{Digest, Sha256};

/// The width of an identity token in characters (hex-encoded SHA-256).
pub const TOKEN_SIZE: usize = 64;

/// Computes the lookup token for a raw identity.
///
/// The token is the lowercase hex encoding of `SHA-256(raw_identity)`:
/// deterministic, fixed-width, and one-way. It is used as the primary key
/// for credential records so the raw username never has to be stored or
/// transmitted past the request boundary.
///
/// This provides pseudonymous indexing, not secrecy. Usernames can have
/// low entropy, so the token must never stand in for password hashing.
pub fn identity_token(raw_identity: &str) -> String {
    hex::encode(Sha256::digest(raw_identity.as_bytes()))
}

/// Returns `true` if `token` has the exact shape produced by
/// [`identity_token`]: 64 lowercase hex characters.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_SIZE
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
