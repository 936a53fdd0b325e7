//! Messaging transport port.
//!
//! The core never inspects transport-level framing; it hands the
//! messenger text plus an optional inline keyboard and receives opaque
//! message ids back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ChatId, DomainError, ErrorCode};
use crate::domain::order::MessageId;

/// One inline button: a label and the callback payload it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// An inline keyboard as rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// Appends a single-button row.
    pub fn push_row(&mut self, button: Button) {
        self.rows.push(vec![button]);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Errors surfaced by the messaging transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("Transport rejected the request: {0}")]
    Rejected(String),
}

impl From<TransportError> for DomainError {
    fn from(err: TransportError) -> Self {
        DomainError::new(ErrorCode::TransportError, err.to_string())
    }
}

/// Port for delivering outbound messages and button acknowledgements.
///
/// All calls are blocking I/O from the caller's perspective; the
/// dispatcher runs each session on its own task so one slow delivery
/// does not stall unrelated chats.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a new message, returning the transport's message id.
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError>;

    /// Edits an existing message in place.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    /// Answers a button press so the platform stops its loading
    /// indicator. Must be called for every press, valid or stale.
    async fn acknowledge(&self, event_id: &str) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messenger_is_object_safe() {
        fn _accepts_dyn(_messenger: &dyn Messenger) {}
    }

    #[test]
    fn keyboard_push_row_appends_single_button_rows() {
        let mut keyboard = Keyboard::default();
        keyboard.push_row(Button::new("Back", "back"));
        assert_eq!(keyboard.rows.len(), 1);
        assert_eq!(keyboard.rows[0][0].label, "Back");
    }
}
