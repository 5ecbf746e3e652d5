//! Session token storage for the Prism client.
//!
//! This crate provides:
//! - A `TokenStorage` trait for named, expiring entries
//! - `MemoryStorage` for in-process sessions and tests
//! - `FileStorage`, a JSON file backend for sessions that survive restarts
//! - `TokenStore`, the high-level access/refresh token API

mod cookie;
mod file;
mod keys;
mod memory;
mod store;
mod traits;

pub use cookie::{CookieOptions, SameSite, StoredEntry};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use store::{TokenExpiryPolicy, TokenStore};
pub use traits::TokenStorage;

use std::path::PathBuf;
use thiserror::Error;

/// Directory name used under the platform data dir.
pub const APP_DIR_NAME: &str = "prism";

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Expiry window cannot be represented as a timestamp
    #[error("Invalid expiry window: {0} days")]
    InvalidExpiry(i64),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Default location of the session file: `<data dir>/prism/session.json`.
pub fn default_session_path() -> StorageResult<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("session.json"))
        .ok_or_else(|| StorageError::Backend("No local data directory on this platform".to_string()))
}

/// Create a `TokenStore` backed by the default session file.
pub fn create_file_token_store(policy: TokenExpiryPolicy) -> StorageResult<TokenStore> {
    let storage = FileStorage::open(default_session_path()?)?;
    Ok(TokenStore::new(Box::new(storage), policy))
}
