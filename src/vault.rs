//! CredentialVault - credential lookup, save, remove, and format migration.
//!
//! This module provides the CredentialVault struct that handles:
//! - Lazy master key initialization (`ensure_encryption`)
//! - Credential lookup keyed by remote host domain
//! - Transparent migration from the legacy per-field format
//! - Save/remove of consolidated encrypted records
//!
//! Errors never escape the public operations: internals use
//! [`VaultResult`] with `?`, and the public boundary catches, logs via
//! `tracing`, and returns `Option`/`bool` as the UI contract requires.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crypto::{decrypt_blob, encrypt_blob};
use crate::domain::{normalize_domain, provider_prefix};
use crate::error::{VaultError, VaultResult};
use crate::legacy::{legacy_keys_for, LegacyKeySet};
use crate::master_key::{MasterKey, MASTER_KEY_STORAGE_KEY};
use crate::store::CredentialStore;

/// A username plus API token for one Git hosting domain.
///
/// `password` holds an API token, not a literal password; the field name
/// is part of the stored JSON format.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the token
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Client-side vault for Git host credentials.
///
/// Owns the in-memory master key and the backing store. The key is
/// loaded or generated lazily on first use and is immutable for the
/// lifetime of the vault; callers never see raw key material.
pub struct CredentialVault {
    store: CredentialStore,
    master_key: Option<MasterKey>,
}

impl CredentialVault {
    /// Create a vault over an already-opened store.
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            master_key: None,
        }
    }

    /// Open a vault rooted at the given data directory.
    pub fn open(data_dir: impl Into<std::path::PathBuf>) -> VaultResult<Self> {
        Ok(Self::new(CredentialStore::open(data_dir)?))
    }

    /// Open a vault in the platform data directory.
    pub fn open_default() -> VaultResult<Self> {
        Ok(Self::new(CredentialStore::open_default()?))
    }

    /// Guarantee a master key is loaded, generating and persisting one if
    /// none exists yet.
    ///
    /// Idempotent and safe to call before every operation. Returns
    /// `false` if key material could not be initialized (e.g. a storage
    /// write failure); all crypto operations are unavailable until a
    /// later call succeeds.
    pub fn ensure_encryption(&mut self) -> bool {
        match self.try_ensure_encryption() {
            Ok(()) => true,
            Err(e) => {
                warn!("encryption setup failed: {}", e);
                false
            }
        }
    }

    fn try_ensure_encryption(&mut self) -> VaultResult<()> {
        if self.master_key.is_some() {
            return Ok(());
        }

        if let Some(encoded) = self.store.get(MASTER_KEY_STORAGE_KEY)? {
            // A key that fails to decode is NOT regenerated: a fresh key
            // would orphan every existing blob.
            let key = MasterKey::from_base64(&encoded)?;
            debug!("master key loaded from store");
            self.master_key = Some(key);
            return Ok(());
        }

        let key = MasterKey::generate();
        self.store
            .set(MASTER_KEY_STORAGE_KEY, &key.to_base64())
            .map_err(|e| {
                VaultError::KeyInitialization(format!("could not persist new master key: {}", e))
            })?;
        info!("generated new master key");
        self.master_key = Some(key);
        Ok(())
    }

    /// Look up the saved credential for a remote URL.
    ///
    /// Reads the consolidated blob for the normalized domain; if absent,
    /// falls back to the legacy per-field entries for the provider prefix
    /// and migrates them on the spot. Undecryptable entries are discarded
    /// and reported as absent. Never panics and never returns an error.
    pub fn lookup_saved_password(&mut self, url: &str) -> Option<CredentialRecord> {
        if !self.ensure_encryption() {
            return None;
        }
        let domain = normalize_domain(url)?;

        match self.lookup_domain(&domain) {
            Ok(found) => found,
            Err(e) => {
                warn!(domain = %domain, "credential lookup failed: {}", e);
                None
            }
        }
    }

    /// Encrypt and store a credential record for a remote URL,
    /// overwriting any previous value. New format only.
    ///
    /// Returns `false` on any failure (logged internally).
    pub fn save_git_auth(&mut self, url: &str, record: &CredentialRecord) -> bool {
        if !self.ensure_encryption() {
            return false;
        }
        let Some(domain) = normalize_domain(url) else {
            warn!(url = %url, "cannot save credentials for unparseable remote URL");
            return false;
        };

        match self.save_domain(&domain, record) {
            Ok(()) => {
                debug!(domain = %domain, "credentials saved");
                true
            }
            Err(e) => {
                warn!(domain = %domain, "failed to save credentials: {}", e);
                false
            }
        }
    }

    /// Delete the credential stored for a remote URL.
    ///
    /// Legacy keys need no cleanup here: migration already removed them,
    /// or they never existed. Returns `false` on any failure.
    pub fn remove_git_auth(&mut self, url: &str) -> bool {
        let Some(domain) = normalize_domain(url) else {
            return false;
        };

        match self.store.remove(&domain) {
            Ok(()) => {
                debug!(domain = %domain, "credentials removed");
                true
            }
            Err(e) => {
                warn!(domain = %domain, "failed to remove credentials: {}", e);
                false
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn loaded_key(&self) -> VaultResult<&MasterKey> {
        self.master_key
            .as_ref()
            .ok_or_else(|| VaultError::KeyInitialization("master key not loaded".into()))
    }

    fn lookup_domain(&self, domain: &str) -> VaultResult<Option<CredentialRecord>> {
        let key = self.loaded_key()?;

        // New format: one blob under the full domain.
        if let Some(blob) = self.store.get(domain)? {
            match decrypt_record(key, &blob) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    warn!(domain = %domain, "discarding undecryptable credential entry: {}", e);
                    if let Err(e) = self.store.remove(domain) {
                        warn!(domain = %domain, "could not delete broken entry: {}", e);
                    }
                    return Ok(None);
                }
            }
        }

        // Legacy format: two scalar blobs under provider-prefixed keys.
        let Some(keys) = provider_prefix(domain).and_then(legacy_keys_for) else {
            return Ok(None);
        };
        let (Some(username_blob), Some(token_blob)) = (
            self.store.get(keys.username_key)?,
            self.store.get(keys.token_key)?,
        ) else {
            return Ok(None);
        };

        let decrypted = decrypt_string(key, &username_blob)
            .and_then(|username| decrypt_string(key, &token_blob).map(|token| (username, token)));
        let (username, password) = match decrypted {
            Ok(fields) => fields,
            Err(e) => {
                // A half-valid pair is useless; drop both fields.
                warn!(provider = %keys.provider, "discarding undecryptable legacy fields: {}", e);
                if let Err(e) = self.store.remove_many(&[keys.username_key, keys.token_key]) {
                    warn!(provider = %keys.provider, "could not delete broken legacy fields: {}", e);
                }
                return Ok(None);
            }
        };

        let record = CredentialRecord { username, password };
        match self.migrate_legacy(domain, keys, &record) {
            Ok(()) => {
                info!(domain = %domain, "migrated legacy credential fields to consolidated format")
            }
            Err(e) => {
                // All-or-nothing: the legacy fields stay untouched and the
                // caller still gets the record.
                warn!(domain = %domain, "credential migration failed, keeping legacy fields: {}", e)
            }
        }
        Ok(Some(record))
    }

    /// Write the consolidated blob, then clear every legacy key for the
    /// provider. The cleanup only runs once the new blob is in place.
    fn migrate_legacy(
        &self,
        domain: &str,
        keys: &LegacyKeySet,
        record: &CredentialRecord,
    ) -> VaultResult<()> {
        let key = self.loaded_key()?;
        let blob = encrypt_record(key, record)
            .map_err(|e| VaultError::MigrationWrite(format!("re-encryption failed: {}", e)))?;
        self.store
            .set(domain, &blob)
            .map_err(|e| VaultError::MigrationWrite(e.to_string()))?;

        if let Err(e) = self.store.remove_many(&keys.all_keys()) {
            warn!(provider = %keys.provider, "migrated but could not clear legacy keys: {}", e);
        }
        Ok(())
    }

    fn save_domain(&self, domain: &str, record: &CredentialRecord) -> VaultResult<()> {
        let blob = encrypt_record(self.loaded_key()?, record)?;
        self.store.set(domain, &blob)
    }
}

fn encrypt_record(key: &MasterKey, record: &CredentialRecord) -> VaultResult<String> {
    let json = serde_json::to_vec(record)?;
    encrypt_blob(key, &json)
}

fn decrypt_record(key: &MasterKey, blob: &str) -> VaultResult<CredentialRecord> {
    let plaintext = decrypt_blob(key, blob)?;
    serde_json::from_slice(&plaintext)
        .map_err(|e| VaultError::Decryption(format!("payload is not a valid record: {}", e)))
}

fn decrypt_string(key: &MasterKey, blob: &str) -> VaultResult<String> {
    let plaintext = decrypt_blob(key, blob)?;
    String::from_utf8(plaintext)
        .map_err(|_| VaultError::Decryption("payload is not valid UTF-8".into()))
}
