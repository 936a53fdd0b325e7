//! Remote tabular store port.
//!
//! The catalog, the destination directory, and the order log all live in
//! remote sheets reached through this contract. Authentication and the
//! wire protocol are the adapter's business.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors surfaced by the tabular store.
#[derive(Debug, Clone, Error)]
pub enum RowStoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),
}

impl From<RowStoreError> for DomainError {
    fn from(err: RowStoreError) -> Self {
        DomainError::new(ErrorCode::UpstreamUnavailable, err.to_string())
    }
}

/// Port for reading ranges and appending rows.
///
/// Ranges use A1 notation (`sheet!A3:C200`) and are passed through
/// verbatim. Reads return rows of cells as strings; trailing empty
/// cells may be absent, which the parsers tolerate.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Reads the full requested range.
    async fn read_range(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, RowStoreError>;

    /// Appends one row after the last data row of the range.
    async fn append_row(
        &self,
        sheet_id: &str,
        range: &str,
        values: &[String],
    ) -> Result<(), RowStoreError>;
}
