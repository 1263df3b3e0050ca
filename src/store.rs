//! Persistent key/value store backing the vault.
//!
//! A single flat string→string JSON document (`credentials.json`) in an
//! application data directory. Values are opaque to this module: the
//! vault stores base64 blobs and the base64 master key here, nothing
//! else. Writes are atomic (temp file + rename) and the document gets
//! 0600 permissions on Unix.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Store file name
pub const STORE_FILE_NAME: &str = "credentials.json";

/// Directory name used under the platform data dir by [`CredentialStore::open_default`].
const DEFAULT_APP_DIR: &str = "credvault";

/// File-backed key/value store for encrypted credential entries.
///
/// Each operation reads the document, applies the change, and rewrites it
/// in full; saves are "last write wins". The store holds no cache, so two
/// instances pointed at the same directory observe each other's writes.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Open (or create) a store rooted at the given data directory.
    pub fn open(data_dir: impl Into<PathBuf>) -> VaultResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            path: data_dir.join(STORE_FILE_NAME),
        })
    }

    /// Open a store in the platform data directory.
    pub fn open_default() -> VaultResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| VaultError::Storage("no platform data directory".into()))?;
        Self::open(base.join(DEFAULT_APP_DIR))
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    /// Store `value` under `key`, overwriting any previous value.
    pub fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    /// Delete the entry under `key`. Idempotent.
    pub fn remove(&self, key: &str) -> VaultResult<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    /// Delete several entries in one rewrite. Idempotent.
    pub fn remove_many(&self, keys: &[&str]) -> VaultResult<()> {
        let mut entries = self.load()?;
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn load(&self) -> VaultResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
        Ok(entries)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> VaultResult<()> {
        let content = serde_json::to_string_pretty(entries)?;

        // Write atomically (write to temp file, then rename)
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (CredentialStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_get_on_empty_store_returns_none() {
        let (store, _dir) = test_store();
        assert_eq!(store.get("github.com").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let (store, _dir) = test_store();
        store.set("github.com", "blob-a").unwrap();
        assert_eq!(store.get("github.com").unwrap().as_deref(), Some("blob-a"));
    }

    #[test]
    fn test_set_overwrites() {
        let (store, _dir) = test_store();
        store.set("github.com", "blob-a").unwrap();
        store.set("github.com", "blob-b").unwrap();
        assert_eq!(store.get("github.com").unwrap().as_deref(), Some("blob-b"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (store, _dir) = test_store();
        store.set("gitlab.com", "blob").unwrap();
        store.remove("gitlab.com").unwrap();
        store.remove("gitlab.com").unwrap();
        assert_eq!(store.get("gitlab.com").unwrap(), None);
    }

    #[test]
    fn test_remove_many() {
        let (store, _dir) = test_store();
        store.set("githubUsername", "u").unwrap();
        store.set("githubToken", "t").unwrap();
        store.set("github.com", "blob").unwrap();

        store
            .remove_many(&["githubUsername", "githubToken", "githubAccessToken"])
            .unwrap();

        assert_eq!(store.get("githubUsername").unwrap(), None);
        assert_eq!(store.get("githubToken").unwrap(), None);
        assert_eq!(store.get("github.com").unwrap().as_deref(), Some("blob"));
    }

    #[test]
    fn test_entries_persist_across_instances() {
        let (store, dir) = test_store();
        store.set("masterKey", "a2V5").unwrap();

        let reopened = CredentialStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("masterKey").unwrap().as_deref(), Some("a2V5"));
    }

    #[test]
    fn test_corrupted_document_is_an_error_not_a_wipe() {
        let (store, _dir) = test_store();
        store.set("github.com", "blob").unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(store.get("github.com").is_err());
        // The broken document must still be on disk, untouched.
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
    }
}
