// storage.rs
// Local key-value persistence for favorites.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::fs;

use crate::error::StorageError;

/// Asynchronous string key-value storage. Values are overwritten wholesale.
pub trait KeyValueStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Stores every key as a JSON file inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        self.root.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);

        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(path).await?))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");

        fs::create_dir_all(&self.root).await?;
        fs::write(&staging, value).await?;
        fs::rename(&staging, &path).await?;

        tracing::debug!("Wrote {} to {}", key, path.display());
        Ok(())
    }
}

/// Volatile storage, useful when nothing should outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }

        Ok(())
    }
}
