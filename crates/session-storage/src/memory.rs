//! In-memory storage backend.

use crate::{StorageResult, StoredEntry, TokenStorage};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-local storage. Entries are lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn put_entry(&self, key: &str, entry: StoredEntry) -> StorageResult<()> {
        self.data.lock().insert(key.to_string(), entry);
        Ok(())
    }

    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.data.lock().remove(key).is_some())
    }
}
