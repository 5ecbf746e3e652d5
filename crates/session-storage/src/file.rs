//! JSON file storage backend.
//!
//! The whole entry map is rewritten on every change through a temporary file
//! and an atomic rename, so a crash never leaves a half-written session file.

use crate::{StorageError, StorageResult, StoredEntry, TokenStorage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage backed by a single JSON document on disk.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file is an empty store. A corrupt file is reported rather
    /// than silently discarded.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(StorageError::Io(err)),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened session file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(entries)?)?;
        restrict_permissions(&tmp_path);
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

// Changes are written to disk first; memory only follows a successful write.
impl TokenStorage for FileStorage {
    fn put_entry(&self, key: &str, entry: StoredEntry) -> StorageResult<()> {
        let mut entries = self.entries.lock();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), entry);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(true)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!(path = %path.display(), error = %err, "Failed to tighten session file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CookieOptions;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage
            .set("access_token", "AT1", None, &CookieOptions::default())
            .unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("access_token").unwrap(), Some("AT1".to_string()));
    }

    #[test]
    fn test_delete_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage
            .set("refresh_token", "RT1", None, &CookieOptions::default())
            .unwrap();
        assert!(storage.delete("refresh_token").unwrap());
        assert!(!storage.delete("refresh_token").unwrap());

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("refresh_token").unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("sessions");
        let storage = FileStorage::open(parent.join("session.json")).unwrap();
        storage
            .set("refresh_token", "RT1", None, &CookieOptions::default())
            .unwrap();

        // A plain file where the directory was makes every later write fail
        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, b"").unwrap();

        assert!(storage
            .set("access_token", "AT1", None, &CookieOptions::default())
            .is_err());
        assert_eq!(storage.get("access_token").unwrap(), None);

        assert!(storage.delete("refresh_token").is_err());
        assert_eq!(storage.get("refresh_token").unwrap(), Some("RT1".to_string()));
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("session.json")).unwrap();

        let past = Utc::now() - Duration::minutes(1);
        storage
            .set("access_token", "stale", Some(past), &CookieOptions::default())
            .unwrap();

        assert_eq!(storage.get("access_token").unwrap(), None);
        assert!(storage.get_entry("access_token").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(matches!(
            FileStorage::open(&path),
            Err(StorageError::Encoding(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::open(&path).unwrap();
        storage
            .set("access_token", "AT1", None, &CookieOptions::default())
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
