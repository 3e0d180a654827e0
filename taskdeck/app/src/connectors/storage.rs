//! Durable key-value storage on the device.
//!
//! Holds the last signed-in email and the last issued push token. Nothing in
//! here is consulted for authorization.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Key of the last email that signed in.
pub const USER_EMAIL_KEY: &str = "userEmail";
/// Key of the last push token issued to this device.
pub const PUSH_TOKEN_KEY: &str = "fcm_token";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot access local storage")]
    Io(#[from] std::io::Error),
    #[error("Local storage is corrupt")]
    Corrupt(#[from] serde_json::Error),
}

#[cfg_attr(test, automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Key-value storage persisted as a JSON object in a single file.
///
/// The file is read once when opened and rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        std::fs::write(&self.path, serde_json::to_string_pretty(&next)?)?;
        *entries = next;
        Ok(())
    }
}

/// Key-value storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("taskdeck-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_opens_empty() {
        let store = JsonFileStore::open(scratch_path()).unwrap();

        assert_eq!(store.get(USER_EMAIL_KEY).unwrap(), None);
    }

    #[test]
    fn values_survive_reopening() {
        // Arrange
        let path = scratch_path();
        let store = JsonFileStore::open(&path).unwrap();

        // Act
        store.set(USER_EMAIL_KEY, "alice@example.com").unwrap();
        store.set(PUSH_TOKEN_KEY, "token-123").unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();

        // Assert
        assert_eq!(
            reopened.get(USER_EMAIL_KEY).unwrap().as_deref(),
            Some("alice@example.com")
        );
        assert_eq!(
            reopened.get(PUSH_TOKEN_KEY).unwrap().as_deref(),
            Some("token-123")
        );
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = scratch_path();
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStore::open(&path);

        assert!(matches!(result, Err(StorageError::Corrupt(_))));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryKeyValueStore::new();

        store.set(USER_EMAIL_KEY, "first@example.com").unwrap();
        store.set(USER_EMAIL_KEY, "second@example.com").unwrap();

        assert_eq!(
            store.get(USER_EMAIL_KEY).unwrap().as_deref(),
            Some("second@example.com")
        );
    }
}
