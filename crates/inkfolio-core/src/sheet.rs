//! Sheet metadata and the ordered sheet registry.

use crate::storage::{Storage, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage key holding the serialized sheet list.
pub const SHEET_LIST_KEY: &str = "sheet-list";

/// Storage key holding one sheet's latest raster snapshot.
pub fn sheet_save_key(sheet_id: &str) -> String {
    format!("sheet-save-{}", sheet_id)
}

/// One independent drawing sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Opaque identity, derived from creation time.
    pub id: String,
    /// Display name; mutable.
    pub name: String,
    /// Creation timestamp in milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// The ordered list of sheets, persisted under [`SHEET_LIST_KEY`].
///
/// The registry exclusively owns the list. A sheet's raster snapshot
/// lives under its own [`sheet_save_key`] and is removed together with
/// the sheet.
pub struct SheetRegistry<S: Storage> {
    sheets: Vec<Sheet>,
    storage: Arc<S>,
}

impl<S: Storage> SheetRegistry<S> {
    /// Load the registry from storage. A missing, empty or corrupt
    /// sheet list falls back to a single fresh default sheet; this is
    /// never a fatal condition.
    pub async fn open(storage: Arc<S>) -> Self {
        let sheets = match storage.get(SHEET_LIST_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Sheet>>(&json) {
                Ok(sheets) => sheets,
                Err(e) => {
                    log::warn!("corrupt sheet list, starting fresh: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("failed to read sheet list, starting fresh: {}", e);
                Vec::new()
            }
        };

        let mut registry = Self { sheets, storage };
        if registry.sheets.is_empty() {
            let sheet = registry.fresh_sheet(1);
            registry.sheets.push(sheet);
            if let Err(e) = registry.persist().await {
                log::warn!("failed to persist initial sheet list: {}", e);
            }
        }
        registry
    }

    /// All sheets in registry order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Look up a sheet by id.
    pub fn get(&self, id: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Append a new sheet with a sequential default name.
    pub async fn create(&mut self) -> StorageResult<Sheet> {
        let sheet = self.fresh_sheet(self.sheets.len() + 1);
        self.sheets.push(sheet.clone());
        self.persist().await?;
        Ok(sheet)
    }

    /// Delete a sheet and its persisted snapshot.
    ///
    /// The last remaining sheet is never deleted outright: deleting it
    /// replaces it with a fresh blank sheet under a new id.
    pub async fn delete(&mut self, id: &str) -> StorageResult<()> {
        if !self.sheets.iter().any(|s| s.id == id) {
            return Ok(());
        }

        if self.sheets.len() == 1 {
            // Replacement id is picked while the old sheet is still
            // listed, so it always differs from the deleted one.
            let replacement = self.fresh_sheet(1);
            self.sheets = vec![replacement];
        } else {
            self.sheets.retain(|s| s.id != id);
        }

        self.storage.remove(&sheet_save_key(id)).await?;
        self.persist().await
    }

    /// Rename a sheet. A blank name falls back to the sequential
    /// default for the sheet's position.
    pub async fn rename(&mut self, id: &str, name: &str) -> StorageResult<()> {
        let Some(position) = self.sheets.iter().position(|s| s.id == id) else {
            return Ok(());
        };

        let trimmed = name.trim();
        self.sheets[position].name = if trimmed.is_empty() {
            default_sheet_name(position + 1)
        } else {
            name.to_string()
        };
        self.persist().await
    }

    /// Persist the sheet list.
    async fn persist(&self) -> StorageResult<()> {
        let json = serde_json::to_string(&self.sheets)
            .map_err(|e| crate::storage::StorageError::Serialization(e.to_string()))?;
        self.storage.set(SHEET_LIST_KEY, &json).await
    }

    fn fresh_sheet(&self, position: usize) -> Sheet {
        let created_at = now_ms();
        Sheet {
            id: self.unique_id(created_at),
            name: default_sheet_name(position),
            created_at,
        }
    }

    /// Ids derive from creation time; same-millisecond collisions bump
    /// until unique within the list.
    fn unique_id(&self, created_at: u64) -> String {
        let mut candidate = created_at;
        loop {
            let id = candidate.to_string();
            if !self.sheets.iter().any(|s| s.id == id) {
                return id;
            }
            candidate += 1;
        }
    }
}

fn default_sheet_name(position: usize) -> String {
    format!("Sheet {}", position)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
