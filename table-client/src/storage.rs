//! Client-durable key-value storage
//!
//! Cart, customer name and the last transaction survive navigation between
//! screens (and restarts, with [`FileStorage`]). Values are JSON strings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};

pub const CART_KEY: &str = "cart";
pub const CUSTOMER_NAME_KEY: &str = "customer_name";
pub const LAST_TRANSACTION_KEY: &str = "last_transaction";

/// Key-value persistence port
pub trait SessionStorage: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// Read and decode a JSON value
///
/// A value that fails to decode is reported as [`ClientError::Serialization`].
pub fn load_json<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> ClientResult<Option<T>> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(storage: &dyn SessionStorage, key: &str, value: &T) -> ClientResult<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

/// In-process storage, lost on drop
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create the directory if missing
    pub fn open(dir: impl AsRef<Path>) -> ClientResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|e| ClientError::Storage(format!("Cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> ClientResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ClientError::Storage(format!("Invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Storage(format!("Cannot read {}: {}", path.display(), e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        // Readers see either the old or the new snapshot
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| ClientError::Storage(format!("Cannot write {}: {}", path.display(), e)))
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!("Cannot remove {}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
        storage.set(CART_KEY, "[]").unwrap();
        assert_eq!(storage.get(CART_KEY).unwrap().as_deref(), Some("[]"));
        storage.remove(CART_KEY).unwrap();
        storage.remove(CART_KEY).unwrap();
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::open(dir.path()).unwrap();
            save_json(&storage, CUSTOMER_NAME_KEY, &"Budi").unwrap();
        }
        let storage = FileStorage::open(dir.path()).unwrap();
        let name: Option<String> = load_json(&storage, CUSTOMER_NAME_KEY).unwrap();
        assert_eq!(name.as_deref(), Some("Budi"));
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(storage.set("../escape", "x").is_err());
    }

    #[test]
    fn test_load_json_reports_corruption() {
        let storage = MemoryStorage::new();
        storage.set(CART_KEY, "{not json").unwrap();
        let result: ClientResult<Option<Vec<u32>>> = load_json(&storage, CART_KEY);
        assert!(matches!(result, Err(ClientError::Serialization(_))));
    }
}
