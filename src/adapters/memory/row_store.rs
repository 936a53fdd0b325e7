//! In-memory row store for testing and development.
//!
//! Holds named sheets as plain row vectors. Appends land at the end of
//! the sheet, mirroring the remote store's append-after-last-row
//! behavior.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{RowStore, RowStoreError};

/// In-memory sheet collection keyed by sheet id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRowStore {
    sheets: Arc<RwLock<HashMap<String, Vec<Vec<String>>>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a sheet's rows.
    pub async fn put_sheet(&self, sheet_id: &str, rows: Vec<Vec<String>>) {
        self.sheets.write().await.insert(sheet_id.to_string(), rows);
    }

    /// Removes a sheet, making further reads and appends fail. Used by
    /// tests to script upstream outages.
    pub async fn remove_sheet(&self, sheet_id: &str) {
        self.sheets.write().await.remove(sheet_id);
    }

    /// Snapshot of a sheet's rows (empty if absent), for assertions.
    pub async fn rows(&self, sheet_id: &str) -> Vec<Vec<String>> {
        self.sheets
            .read()
            .await
            .get(sheet_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn read_range(
        &self,
        sheet_id: &str,
        _range: &str,
    ) -> Result<Vec<Vec<String>>, RowStoreError> {
        let sheets = self.sheets.read().await;
        sheets
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| RowStoreError::UnknownSheet(sheet_id.to_string()))
    }

    async fn append_row(
        &self,
        sheet_id: &str,
        _range: &str,
        values: &[String],
    ) -> Result<(), RowStoreError> {
        let mut sheets = self.sheets.write().await;
        let rows = sheets
            .get_mut(sheet_id)
            .ok_or_else(|| RowStoreError::UnknownSheet(sheet_id.to_string()))?;
        rows.push(values.to_vec());
        Ok(())
    }
}
