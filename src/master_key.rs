//! The master encryption key and its at-rest encoding.
//!
//! This module provides:
//! - `MasterKey`: A 256-bit key wrapper that zeroizes on drop
//! - Lazy generation via the process CSPRNG
//! - Base64 encoding/decoding for the persisted form
//!
//! The key is generated once per installation and never rotated. It lives
//! in the backing store under [`MASTER_KEY_STORAGE_KEY`] and is loaded
//! into memory on first use in each process.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{VaultError, VaultResult};

/// Key size for AES-256 (256 bits = 32 bytes)
const KEY_SIZE: usize = 32;

/// Storage key under which the base64-encoded master key is persisted.
pub const MASTER_KEY_STORAGE_KEY: &str = "masterKey";

/// A 256-bit encryption key with automatic zeroization on drop.
///
/// This wrapper ensures that the key material is securely erased from
/// memory when the vault is dropped. Callers of the vault never see raw
/// key material; this type does not leave the crate.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Generate a fresh random key from the process CSPRNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Decode a key from its persisted base64 form.
    ///
    /// # Errors
    /// Returns [`VaultError::KeyInitialization`] if the encoding is not
    /// valid base64 or does not decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> VaultResult<Self> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
            VaultError::KeyInitialization(format!("stored master key is not valid base64: {}", e))
        })?;

        if bytes.len() != KEY_SIZE {
            return Err(VaultError::KeyInitialization(format!(
                "stored master key has wrong size: expected {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Encode the key for persistence.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.key)
    }

    /// Get the key as a byte slice for cryptographic operations.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the actual key material
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_distinct_keys() {
        let key1 = MasterKey::generate();
        let key2 = MasterKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_base64_round_trip() {
        let key = MasterKey::generate();
        let decoded = MasterKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn test_from_base64_rejects_wrong_size() {
        let encoded = BASE64.encode([0u8; 16]);
        assert!(MasterKey::from_base64(&encoded).is_err());
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        assert!(MasterKey::from_base64("not base64 at all!!!").is_err());
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let key = MasterKey::generate();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&key.to_base64()));
    }
}
