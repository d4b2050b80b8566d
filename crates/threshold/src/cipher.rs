//! Client-side symmetric encryption with ChaCha20-Poly1305 AEAD.
//!
//! Each attachment gets a fresh 256-bit key from the OS RNG. The random
//! 96-bit nonce is prepended to the ciphertext so the blob is
//! self-contained. Key material is zeroized on drop.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce as ChaCha20Nonce,
};
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Nonce size for ChaCha20-Poly1305 (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// Symmetric key size (256 bits / 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Symmetric cipher error types.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Ciphertext too short: {0} bytes")]
    TruncatedCiphertext(usize),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

/// A symmetric content key. Zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generate a fresh key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        SymmetricKey(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != KEY_SIZE {
            return Err(CipherError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(SymmetricKey(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("SymmetricKey(..)")
    }
}

/// Encrypt plaintext; output is `nonce || ciphertext || tag`.
pub fn encrypt_bytes(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.as_bytes()));
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = ChaCha20Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CipherError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a `nonce || ciphertext || tag` blob.
pub fn decrypt_bytes(key: &SymmetricKey, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
    if blob.len() < NONCE_SIZE {
        return Err(CipherError::TruncatedCiphertext(blob.len()));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);
    let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(ChaCha20Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| CipherError::Decryption(e.to_string()))
}
