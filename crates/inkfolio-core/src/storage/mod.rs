//! Storage abstraction for persistence.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for key/value blob storage backends.
///
/// Values are portable strings: the sheet list as JSON, per-sheet
/// raster snapshots as encoded images. Implementations can store blobs
/// in memory, on the filesystem, or in a browser-style local store.
pub trait Storage: Send + Sync {
    /// Read the blob under `key`; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Write the blob under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove the blob under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check whether a blob exists under `key`.
    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
