//! File-based storage implementation for native use.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::fs;
use std::path::PathBuf;

/// File-based storage.
///
/// Stores each key's blob as one file in a base directory.
pub struct FileStorage {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location
    /// (`<local data dir>/inkfolio/sheets/`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        let path = base.join("inkfolio").join("sheets");
        Self::new(path)
    }

    /// Get the file path for a key.
    fn blob_path(&self, key: &str) -> PathBuf {
        // Sanitize the key to be safe for filenames
        let safe_key: String = key.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.dat", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let path = self.blob_path(key);

        Box::pin(async move {
            if !path.exists() {
                return Ok(None);
            }

            fs::read_to_string(&path)
                .map(Some)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.blob_path(key);
        let value = value.to_string();

        Box::pin(async move {
            fs::write(&path, value).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.blob_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.blob_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_set_get() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.set("sheet-list", "[]")).unwrap();
        let value = block_on(storage.get("sheet-list")).unwrap();

        assert_eq!(value.as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_storage_missing_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(block_on(storage.get("nonexistent")).unwrap(), None);
    }

    #[test]
    fn test_file_storage_remove() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.set("key", "value")).unwrap();
        assert!(block_on(storage.contains("key")).unwrap());

        block_on(storage.remove("key")).unwrap();
        assert!(!block_on(storage.contains("key")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        // A key with special characters should be sanitized
        block_on(storage.set("sheet/save:with*special", "blob")).unwrap();

        // Should still be readable with the same key
        let value = block_on(storage.get("sheet/save:with*special")).unwrap();
        assert_eq!(value.as_deref(), Some("blob"));
    }
}
