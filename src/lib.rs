//! Client-side credential encryption for Git hosting providers.
//!
//! This crate provides encrypted at-rest storage for Git host
//! credentials (username + API token), keyed by remote domain:
//! - A per-installation 256-bit master key, generated lazily and held
//!   only in memory once loaded
//! - AES-256-GCM blobs (`base64(nonce ‖ ciphertext)`) in a local JSON
//!   key/value document
//! - Transparent migration from the legacy per-field storage format
//!
//! The public surface is [`CredentialVault`] with four operations:
//! `ensure_encryption`, `lookup_saved_password`, `save_git_auth`,
//! `remove_git_auth`. Expected failures never propagate to callers;
//! operations return `Option`/`bool` and log detail via `tracing`.

mod crypto;
mod domain;
mod legacy;
mod master_key;

pub mod error;
pub mod store;
pub mod vault;

pub use error::{VaultError, VaultResult};
pub use store::CredentialStore;
pub use vault::{CredentialRecord, CredentialVault};
