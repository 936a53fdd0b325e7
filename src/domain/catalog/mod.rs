//! Catalog model: categories of orderable items, built from sheet rows.
//!
//! The source table is semi-structured. A row whose first cell is
//! non-empty opens a new category (its title is the part after the last
//! colon); the numeric-code item rows that follow belong to it until the
//! next header or end of data. Rows that don't fit the grammar are
//! skipped, never fatal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::foundation::ItemCode;

/// One orderable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    code: ItemCode,
    display_name: String,
    description: String,
}

impl Item {
    /// Builds an item, deriving the display name from the description.
    ///
    /// When the description carries a double-quoted substring, that
    /// substring is the display name; otherwise the whole description is.
    pub fn new(code: ItemCode, description: String) -> Self {
        let display_name = quoted_substring(&description)
            .unwrap_or(description.as_str())
            .to_string();
        Self {
            code,
            display_name,
            description,
        }
    }

    pub fn code(&self) -> ItemCode {
        self.code
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A titled group of items, in source-row order of appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    title: String,
    items: BTreeMap<u32, Item>,
}

impl Category {
    fn new(title: String) -> Self {
        Self {
            title,
            items: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Items ordered by code.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn item(&self, code: ItemCode) -> Option<&Item> {
        self.items.get(&code.as_u32())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parses raw sheet rows into categories, top to bottom.
///
/// Skips item rows with fewer than 3 cells, an unparseable code cell, or
/// an empty description cell. Item rows before the first header are
/// skipped too since they have no category to belong to.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        let first = row.first().map(String::as_str).unwrap_or("");
        if !first.trim().is_empty() {
            categories.push(Category::new(header_title(first)));
            continue;
        }

        let Some(current) = categories.last_mut() else {
            debug!(row = row_index, "skipping item row before first category header");
            continue;
        };
        if row.len() < 3 || row[2].trim().is_empty() {
            debug!(row = row_index, "skipping row without code or description");
            continue;
        }
        let code = match row[1].parse::<ItemCode>() {
            Ok(code) => code,
            Err(_) => {
                debug!(row = row_index, cell = %row[1], "skipping row with non-numeric code");
                continue;
            }
        };
        current
            .items
            .insert(code.as_u32(), Item::new(code, row[2].trim().to_string()));
    }

    categories
}

/// Header cell -> category title: the substring after the last colon,
/// trimmed, or the whole cell when there is none.
fn header_title(cell: &str) -> String {
    cell.rsplit(':').next().unwrap_or(cell).trim().to_string()
}

/// First double-quoted substring of `text`, if any.
fn quoted_substring(text: &str) -> Option<&str> {
    let start = text.find('"')?;
    let rest = &text[start + 1..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_row_opens_category_with_title_after_colon() {
        let parsed = parse_rows(&rows(&[&["Category: Ropes"]]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title(), "Ropes");
        assert!(parsed[0].is_empty());
    }

    #[test]
    fn header_without_colon_uses_whole_cell() {
        let parsed = parse_rows(&rows(&[&["Hardware"]]));
        assert_eq!(parsed[0].title(), "Hardware");
    }

    #[test]
    fn item_rows_attach_to_preceding_header() {
        let parsed = parse_rows(&rows(&[
            &["Cat: Ropes"],
            &["", "101", "Climbing rope \"Alpine\""],
            &["", "102", ""],
        ]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title(), "Ropes");
        assert_eq!(parsed[0].len(), 1);

        let item = parsed[0].item(ItemCode::new(101)).unwrap();
        assert_eq!(item.display_name(), "Alpine");
        assert_eq!(item.description(), "Climbing rope \"Alpine\"");
    }

    #[test]
    fn unquoted_description_is_its_own_display_name() {
        let item = Item::new(ItemCode::new(7), "Plain shackle".to_string());
        assert_eq!(item.display_name(), "Plain shackle");
    }

    #[test]
    fn short_rows_and_bad_codes_are_skipped() {
        let parsed = parse_rows(&rows(&[
            &["Cat: Ropes"],
            &["", "abc", "Not a code"],
            &["", "103"],
            &["", "104", "Kept \"Keeper\""],
        ]));
        assert_eq!(parsed[0].len(), 1);
        assert!(parsed[0].item(ItemCode::new(104)).is_some());
    }

    #[test]
    fn items_before_first_header_are_dropped() {
        let parsed = parse_rows(&rows(&[
            &["", "101", "Orphan"],
            &["Cat: Ropes"],
            &["", "102", "Kept"],
        ]));
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].item(ItemCode::new(101)).is_none());
        assert!(parsed[0].item(ItemCode::new(102)).is_some());
    }

    #[test]
    fn categories_keep_source_order() {
        let parsed = parse_rows(&rows(&[
            &["Cat: Ropes"],
            &["", "101", "Rope"],
            &["Cat: Hooks"],
            &["", "201", "Hook"],
        ]));
        assert_eq!(parsed[0].title(), "Ropes");
        assert_eq!(parsed[1].title(), "Hooks");
    }

    #[test]
    fn rebuild_is_fresh_each_time() {
        let first = parse_rows(&rows(&[&["Cat: A"], &["", "1", "X"]]));
        let second = parse_rows(&rows(&[&["Cat: A"]]));
        assert_eq!(first[0].len(), 1);
        assert!(second[0].is_empty());
    }
}
