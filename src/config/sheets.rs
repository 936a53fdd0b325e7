//! Spreadsheet layout configuration
//!
//! Identifies the remote tables the core reads and appends to: the item
//! catalog, the order log, and the destination directory. Ranges use A1
//! notation and are passed verbatim to the `RowStore` collaborator.

use serde::Deserialize;

use super::error::ValidationError;

/// Spreadsheet ids and ranges for the three backing tables
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet holding the category/item table
    pub catalog_sheet_id: String,

    /// Range of the catalog rows
    #[serde(default = "default_catalog_range")]
    pub catalog_range: String,

    /// Spreadsheet holding the order log
    pub orders_sheet_id: String,

    /// Range order rows are appended to
    #[serde(default = "default_orders_range")]
    pub orders_range: String,

    /// Range of the order id column, scanned once at startup to seed
    /// the ledger counter
    #[serde(default = "default_order_id_range")]
    pub order_id_range: String,

    /// Spreadsheet holding the destination directory
    pub destinations_sheet_id: String,

    /// Range of the destination name column
    #[serde(default = "default_destinations_range")]
    pub destinations_range: String,
}

impl SheetsConfig {
    /// Validate spreadsheet configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.catalog_sheet_id.is_empty() {
            return Err(ValidationError::EmptySheetId("catalog_sheet_id"));
        }
        if self.orders_sheet_id.is_empty() {
            return Err(ValidationError::EmptySheetId("orders_sheet_id"));
        }
        if self.destinations_sheet_id.is_empty() {
            return Err(ValidationError::EmptySheetId("destinations_sheet_id"));
        }
        for (name, range) in [
            ("catalog_range", &self.catalog_range),
            ("orders_range", &self.orders_range),
            ("order_id_range", &self.order_id_range),
            ("destinations_range", &self.destinations_range),
        ] {
            if !range.contains('!') {
                return Err(ValidationError::InvalidRange(name));
            }
        }
        Ok(())
    }
}

fn default_catalog_range() -> String {
    "items!A3:C200".to_string()
}

fn default_orders_range() -> String {
    "orders!A2:I".to_string()
}

fn default_order_id_range() -> String {
    "orders!A2:A".to_string()
}

fn default_destinations_range() -> String {
    "destinations!A2:A".to_string()
}
