//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            Ok(blobs.get(&key).cloned())
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let mut blobs = self.blobs.write().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            blobs.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut blobs = self.blobs.write().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            blobs.remove(&key);
            Ok(())
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            Ok(blobs.contains_key(&key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::block_on;

    #[test]
    fn test_set_and_get() {
        let storage = MemoryStorage::new();

        block_on(storage.set("sheet-save-1", "data:image/png;base64,AAAA")).unwrap();
        let value = block_on(storage.get("sheet-save-1")).unwrap();

        assert_eq!(value.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert_eq!(block_on(storage.get("nonexistent")).unwrap(), None);
    }

    #[test]
    fn test_contains() {
        let storage = MemoryStorage::new();

        assert!(!block_on(storage.contains("key")).unwrap());
        block_on(storage.set("key", "value")).unwrap();
        assert!(block_on(storage.contains("key")).unwrap());
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();

        block_on(storage.set("key", "value")).unwrap();
        block_on(storage.remove("key")).unwrap();
        assert!(!block_on(storage.contains("key")).unwrap());

        // Removing again is not an error.
        block_on(storage.remove("key")).unwrap();
    }

    #[test]
    fn test_overwrite() {
        let storage = MemoryStorage::new();

        block_on(storage.set("key", "first")).unwrap();
        block_on(storage.set("key", "second")).unwrap();
        assert_eq!(block_on(storage.get("key")).unwrap().as_deref(), Some("second"));
    }
}
