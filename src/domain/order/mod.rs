//! Orders: the draft accumulated during a conversation and the
//! immutable record written to the ledger.

mod state;

pub use state::OrderFlowState;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::destination::Destination;
use crate::domain::foundation::{DomainError, ErrorCode, ItemCode, OrderId, Timestamp};

/// Message id of the inline menu currently being edited in place.
pub type MessageId = i64;

/// A delivery deadline as day and month, entered as `D.MM` or `DD.MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    day: u8,
    month: u8,
}

impl Deadline {
    /// Parses deadline text.
    ///
    /// The day part is one or two digits, the month part exactly two;
    /// values must form a plausible calendar date. Anything else is
    /// `None` - the engine silently waits for well-formed input.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (day_part, month_part) = text.split_once('.')?;
        if day_part.is_empty() || day_part.len() > 2 || month_part.len() != 2 {
            return None;
        }
        if !day_part.chars().all(|c| c.is_ascii_digit())
            || !month_part.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        let day: u8 = day_part.parse().ok()?;
        let month: u8 = month_part.parse().ok()?;
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { day, month })
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.day, self.month)
    }
}

/// Parses quantity text: valid iff the whole trimmed input is digits.
pub fn parse_count(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// The order under construction during one conversation.
///
/// Each field is populated by exactly one state transition and cleared
/// again when the user steps back past the step that set it. The draft
/// is owned by its session and never shared across chats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub category_index: Option<usize>,
    pub item_code: Option<ItemCode>,
    pub count: Option<u32>,
    pub deadline: Option<Deadline>,
    pub destination: Option<Destination>,
    pub comment: Option<String>,
    /// Menu message the conversation is editing in place, if any.
    pub pending_message_id: Option<MessageId>,
}

impl DraftOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything, including the tracked menu message.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A recorded order. Created only by the ledger; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub item_code: ItemCode,
    pub item_name: String,
    pub count: u32,
    pub customer: String,
    pub timestamp: Timestamp,
    pub deadline: Deadline,
    pub destination: String,
    pub comment: String,
}

impl Order {
    /// Assembles the immutable record from a completed draft.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if a required draft field is missing - the
    /// state machine should have made that impossible, so this guards
    /// against programming errors, not user input.
    pub fn assemble(
        id: OrderId,
        draft: &DraftOrder,
        item_name: impl Into<String>,
        customer: impl Into<String>,
        timestamp: Timestamp,
    ) -> Result<Self, DomainError> {
        let missing = |field: &str| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Draft is missing '{}' at the terminal transition", field),
            )
        };
        Ok(Self {
            id,
            item_code: draft.item_code.ok_or_else(|| missing("item_code"))?,
            item_name: item_name.into(),
            count: draft.count.ok_or_else(|| missing("count"))?,
            customer: customer.into(),
            timestamp,
            deadline: draft.deadline.ok_or_else(|| missing("deadline"))?,
            destination: draft
                .destination
                .as_ref()
                .map(|d| d.name().to_string())
                .ok_or_else(|| missing("destination"))?,
            comment: draft.comment.clone().unwrap_or_default(),
        })
    }

    /// The fixed column layout of the order-log sheet.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.timestamp.as_row_cell(),
            self.item_code.to_string(),
            self.item_name.clone(),
            self.count.to_string(),
            self.customer.clone(),
            self.deadline.to_string(),
            self.destination.clone(),
            self.comment.clone(),
        ]
    }
}
