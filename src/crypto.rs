//! AES-256-GCM blob encryption.
//!
//! Blob format: `base64(nonce[12] ‖ ciphertext+tag)`. Every encryption
//! generates a fresh random 96-bit nonce; nonce reuse under the same key
//! would break both confidentiality and integrity of GCM. Decryption
//! verifies the GCM tag, so any bit tampering or a foreign key produces a
//! [`VaultError::Decryption`] rather than corrupted plaintext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;

use crate::error::{VaultError, VaultResult};
use crate::master_key::MasterKey;

/// Nonce size for AES-GCM (96 bits = 12 bytes)
const NONCE_SIZE: usize = 12;

/// Encrypt a plaintext into an opaque blob string.
pub fn encrypt_blob(key: &MasterKey, plaintext: &[u8]) -> VaultResult<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(format!("Invalid key: {}", e)))?;

    // Generate random nonce
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // Encrypt
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::Encryption(format!("Encryption failed: {}", e)))?;

    // Prepend nonce to ciphertext
    let mut output = nonce_bytes.to_vec();
    output.extend(ciphertext);

    Ok(BASE64.encode(output))
}

/// Decrypt a blob string produced by [`encrypt_blob`].
///
/// # Errors
/// Returns [`VaultError::Decryption`] if the blob is not valid base64,
/// is too short to contain a nonce, or fails GCM authentication (wrong
/// key or tampered data).
pub fn decrypt_blob(key: &MasterKey, blob: &str) -> VaultResult<Vec<u8>> {
    let encrypted = BASE64
        .decode(blob.trim())
        .map_err(|e| VaultError::Decryption(format!("invalid base64: {}", e)))?;

    if encrypted.len() < NONCE_SIZE {
        return Err(VaultError::Decryption("blob too short".into()));
    }

    // Extract nonce and ciphertext
    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(format!("Invalid key: {}", e)))?;

    // Decrypt; GCM tag verification catches wrong keys and tampering
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::Decryption("authentication failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let key = MasterKey::generate();
        let plaintext = b"api token value";

        let blob = encrypt_blob(&key, plaintext).unwrap();
        let decrypted = decrypt_blob(&key, &blob).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_round_trip_utf8() {
        let key = MasterKey::generate();
        let plaintext = "pässwörd-ütf8-ところ".as_bytes();

        let blob = encrypt_blob(&key, plaintext).unwrap();
        assert_eq!(decrypt_blob(&key, &blob).unwrap(), plaintext);
    }

    #[test]
    fn test_same_plaintext_produces_different_blobs() {
        let key = MasterKey::generate();
        let plaintext = b"same input twice";

        let blob1 = encrypt_blob(&key, plaintext).unwrap();
        let blob2 = encrypt_blob(&key, plaintext).unwrap();

        // Fresh nonce per call means the blobs must differ.
        assert_ne!(blob1, blob2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = MasterKey::generate();
        let key2 = MasterKey::generate();

        let blob = encrypt_blob(&key1, b"secret data").unwrap();
        let result = decrypt_blob(&key2, &blob);

        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_tampered_blob_fails() {
        let key = MasterKey::generate();
        let blob = encrypt_blob(&key, b"do not tamper").unwrap();

        // Flip one bit of the ciphertext and re-encode.
        let mut raw = BASE64.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = BASE64.encode(raw);

        let result = decrypt_blob(&key, &tampered);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = MasterKey::generate();
        let blob = encrypt_blob(&key, b"nonce matters").unwrap();

        let mut raw = BASE64.decode(&blob).unwrap();
        raw[0] ^= 0x01;
        let tampered = BASE64.encode(raw);

        assert!(decrypt_blob(&key, &tampered).is_err());
    }

    #[test]
    fn test_truncated_blob_fails() {
        let key = MasterKey::generate();
        let short = BASE64.encode([0u8; NONCE_SIZE - 1]);
        assert!(matches!(
            decrypt_blob(&key, &short),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn test_garbage_blob_fails() {
        let key = MasterKey::generate();
        assert!(matches!(
            decrypt_blob(&key, "%%% not base64 %%%"),
            Err(VaultError::Decryption(_))
        ));
    }
}
