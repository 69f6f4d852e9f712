use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};
use crate::error::{AppError, Result};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM initialization vector in bytes.
pub const IV_SIZE: usize = 12;

/// A secure key wrapper that ensures the key is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecureKey([u8; KEY_SIZE]);

impl SecureKey {
    /// Creates a new `SecureKey` from a byte array.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Returns a reference to the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Generates a fresh random initialization vector.
///
/// A new iv is drawn for every encryption operation; reusing an iv with
/// the same key would void the GCM security guarantees.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypts a plaintext using AES-256-GCM.
///
/// # Returns
///
/// A tuple containing the ciphertext (tag appended) and the fresh iv used
/// for this operation.
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; IV_SIZE])> {
    let cipher = Aes256Gcm::new(key.into());

    let iv_bytes = generate_iv();
    let nonce = Nonce::from(iv_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok((ciphertext, iv_bytes))
}

/// Decrypts a ciphertext using AES-256-GCM.
///
/// Fails closed: any tampering with the key, iv or ciphertext surfaces as
/// [`AppError::AuthenticationFailed`], never as garbage plaintext.
pub fn decrypt(key: &[u8; KEY_SIZE], ciphertext: &[u8], iv: &[u8; IV_SIZE]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from(*iv);

    cipher
        .decrypt(&nonce, ciphertext)
        .map_err(|_| AppError::AuthenticationFailed)
}
