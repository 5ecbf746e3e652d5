//! Storage trait definitions.

use crate::{CookieOptions, StorageResult, StoredEntry};
use chrono::{DateTime, Utc};

/// Trait for token storage backends.
///
/// Backends store raw entries; expiry is evaluated on read by the provided
/// methods so every backend treats an expired entry as absent.
pub trait TokenStorage: Send + Sync {
    /// Store an entry, replacing any previous value under the same name.
    fn put_entry(&self, key: &str, entry: StoredEntry) -> StorageResult<()>;

    /// Retrieve the raw entry, expired or not.
    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>>;

    /// Delete an entry. Returns true if something was removed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Store a value with an optional expiry instant.
    fn set(
        &self,
        key: &str,
        value: &str,
        expires_at: Option<DateTime<Utc>>,
        options: &CookieOptions,
    ) -> StorageResult<()> {
        self.put_entry(key, StoredEntry::new(value, expires_at, options))
    }

    /// Retrieve a live value. Expired entries are removed and read as `None`.
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.get_entry(key)? {
            Some(entry) if entry.is_expired_at(Utc::now()) => {
                self.delete(key)?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    /// Check if a live value exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: TokenStorage + ?Sized> TokenStorage for std::sync::Arc<T> {
    fn put_entry(&self, key: &str, entry: StoredEntry) -> StorageResult<()> {
        (**self).put_entry(key, entry)
    }

    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>> {
        (**self).get_entry(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        (**self).delete(key)
    }
}
