//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of one chat, issued by the messaging transport.
///
/// One active ordering conversation exists per chat, so this doubles as
/// the session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

impl ChatId {
    /// Creates a ChatId from the transport's numeric id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the inner numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric item code, unique within its category's row range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(u32);

impl ItemCode {
    /// Creates an ItemCode from a raw code.
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the inner code.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| ValidationError::invalid_format("item_code", "expected an integer"))
    }
}

/// Zero-padded sequential order identifier, e.g. `"00043"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Formats a counter value as a fixed-width id.
    pub fn from_counter(value: u64, width: usize) -> Self {
        Self(format!("{:0width$}", value, width = width))
    }

    /// Parses the numeric value out of a previously formatted id.
    ///
    /// Returns `None` for cells that are not ids (headers, blanks).
    pub fn parse_numeric(cell: &str) -> Option<u64> {
        cell.trim().parse::<u64>().ok()
    }

    /// Returns the formatted id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
