//! Durable client storage.
//!
//! A flat key → string map with synchronous reads and writes, the same
//! contract a browser gives through `localStorage`. Values are JSON except
//! for the bearer token, which is stored as the raw string.
//!
//! Two backends are provided:
//! - [`MemoryStorage`] - process lifetime only (tests, ephemeral tools)
//! - [`FileStorage`] - a single JSON file rewritten on every change
//!
//! No cross-process coordination is attempted: two processes sharing one
//! file race and the last write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage keys shared by every store.
pub mod keys {
    /// Raw bearer token.
    pub const TOKEN: &str = "token-store";
    /// Enriched profile JSON.
    pub const PROFILE: &str = "profile-store";
    /// Coefficient lists JSON.
    pub const COEFFICIENTS: &str = "coefficients:allCoefficients";
    /// Combined materials catalogue JSON.
    pub const MATERIALS: &str = "material:allMaterials";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Synchronous key-value storage.
pub trait Storage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the change.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the change.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON value.
///
/// Returns `None` when the key is absent and `Some(Err)` when the stored
/// text is not valid for `T`.
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Option<Result<T, serde_json::Error>> {
    storage.get(key).map(|raw| serde_json::from_str(&raw))
}

/// Serialize and write a JSON value.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn save_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

/// Write-through helper for stores: durable writes are best effort, so a
/// failure is logged and otherwise ignored.
pub(crate) fn persist_json<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T) {
    if let Err(e) = save_json(storage, key, value) {
        warn!(key, error = %e, "Failed to persist to durable storage");
    }
}

/// Remove helper for stores; failures are logged and otherwise ignored.
pub(crate) fn forget(storage: &dyn Storage, key: &str) {
    if let Err(e) = storage.remove(key) {
        warn!(key, error = %e, "Failed to remove from durable storage");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage. Cloning is not supported; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// JSON-file backed storage.
///
/// The whole map is loaded on open and rewritten (temp file + rename) on
/// every change. A corrupt file is treated as empty and overwritten by the
/// next write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create on first write) the storage file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Storage file is corrupt, starting empty"
                );
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened durable storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.save(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.save(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("order_portal_storage_{}", uuid::Uuid::new_v4()))
            .join("storage.json")
    }

    #[test]
    fn test_memory_storage_crud() {
        let storage = MemoryStorage::new();
        assert!(storage.get("a").is_none());

        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").as_deref(), Some("1"));
        assert_eq!(storage.len(), 1);

        storage.remove("a").unwrap();
        storage.remove("a").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        save_json(&storage, "list", &vec![1, 2, 3]).unwrap();
        let loaded: Vec<i32> = load_json(&storage, "list").unwrap().unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);

        storage.set("broken", "{not json").unwrap();
        assert!(load_json::<Vec<i32>>(&storage, "broken").unwrap().is_err());
        assert!(load_json::<Vec<i32>>(&storage, "missing").is_none());
    }

    #[test]
    fn test_file_storage_persists_across_opens() {
        let path = temp_path();
        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set(keys::TOKEN, "abc").unwrap();
            storage.set(keys::PROFILE, r#"{"username":"u"}"#).unwrap();
            storage.remove(keys::PROFILE).unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).as_deref(), Some("abc"));
        assert!(reopened.get(keys::PROFILE).is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_storage_corrupt_file_starts_empty() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"garbage").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get(keys::TOKEN).is_none());
        storage.set(keys::TOKEN, "t").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).as_deref(), Some("t"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_storage_failed_write_keeps_memory_unchanged() {
        let path = temp_path();
        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::TOKEN, "old").unwrap();

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();

        assert!(storage.set(keys::TOKEN, "new").is_err());
        assert_eq!(storage.get(keys::TOKEN).as_deref(), Some("old"));
        assert!(storage.remove(keys::TOKEN).is_err());
        assert_eq!(storage.get(keys::TOKEN).as_deref(), Some("old"));
    }
}
