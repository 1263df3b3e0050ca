//! Vault-specific error types for credential storage operations.
//!
//! This module provides granular error handling for vault operations,
//! allowing the frontend to display appropriate user-facing messages
//! and take corrective actions.

use thiserror::Error;

/// Errors that can occur during vault operations.
///
/// These errors are internal detail: the public [`CredentialVault`]
/// operations catch them, log them, and expose only the optional-value /
/// boolean contract to callers.
///
/// [`CredentialVault`]: crate::vault::CredentialVault
#[derive(Error, Debug)]
pub enum VaultError {
    /// The master key could not be generated, persisted, or decoded.
    /// This is the only failure class surfaced to callers (as `false`
    /// from `ensure_encryption`).
    #[error("Encryption key could not be initialized: {0}")]
    KeyInitialization(String),

    /// A stored blob failed authentication or was malformed.
    /// Always converted to "no credential found" at the public boundary.
    #[error("Stored credential could not be decrypted: {0}")]
    Decryption(String),

    /// An error occurred in the encryption layer.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Writing the migrated new-format record failed.
    /// Swallowed by the lookup path; legacy data is left intact.
    #[error("Credential migration write failed: {0}")]
    MigrationWrite(String),

    /// The backing store is unusable (e.g. no platform data directory).
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O error occurred (file access, permissions, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for vault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

impl serde::Serialize for VaultError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        // Serialize as a structured object for better frontend handling
        let mut state = serializer.serialize_struct("VaultError", 2)?;

        // Error code for programmatic handling
        let code = match self {
            VaultError::KeyInitialization(_) => "KEY_INITIALIZATION",
            VaultError::Decryption(_) => "DECRYPTION_FAILED",
            VaultError::Encryption(_) => "ENCRYPTION_ERROR",
            VaultError::MigrationWrite(_) => "MIGRATION_WRITE_FAILED",
            VaultError::Storage(_) => "STORAGE_ERROR",
            VaultError::Io(_) => "IO_ERROR",
            VaultError::Serialization(_) => "SERIALIZATION_ERROR",
        };

        state.serialize_field("code", code)?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
