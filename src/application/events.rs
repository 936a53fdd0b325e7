//! Inbound events and outbound actions.
//!
//! The transport adapter translates platform updates into
//! [`InboundEvent`]s; the engine answers with [`OutboundAction`]s that
//! the dispatcher performs through the messenger port. The engine never
//! touches transport framing directly.

use crate::domain::foundation::ChatId;
use crate::domain::order::MessageId;
use crate::ports::Keyboard;

/// Slash commands understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Usage greeting.
    Start,
    /// Begin an ordering conversation.
    Order,
    /// Cancel the conversation in progress.
    Abort,
    /// Administrative: force both caches to refetch on next read.
    Refresh,
    /// Administrative: report the current chat id.
    ChatId,
}

impl Command {
    /// Parses a slash command, tolerating a `@botname` suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let command = text.split_whitespace().next()?;
        let command = command.split('@').next().unwrap_or(command);
        match command {
            "/start" => Some(Command::Start),
            "/order" => Some(Command::Order),
            "/abort" => Some(Command::Abort),
            "/refresh" => Some(Command::Refresh),
            "/chatid" => Some(Command::ChatId),
            _ => None,
        }
    }
}

/// What kind of event arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A recognized slash command.
    Command(Command),
    /// Free text.
    Text(String),
    /// An inline button press on some (possibly old) menu message.
    Button {
        /// Transport id used to acknowledge the press.
        event_id: String,
        /// The message the pressed button was attached to.
        message_id: MessageId,
        /// The button's callback payload.
        data: String,
    },
}

/// One event, tagged with the chat it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat: ChatId,
    /// Display name of the sender, recorded on the order.
    pub sender: String,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn command(chat: ChatId, sender: impl Into<String>, command: Command) -> Self {
        Self {
            chat,
            sender: sender.into(),
            kind: EventKind::Command(command),
        }
    }

    pub fn text(chat: ChatId, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat,
            sender: sender.into(),
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn button(
        chat: ChatId,
        sender: impl Into<String>,
        event_id: impl Into<String>,
        message_id: MessageId,
        data: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            sender: sender.into(),
            kind: EventKind::Button {
                event_id: event_id.into(),
                message_id,
                data: data.into(),
            },
        }
    }
}

/// What the engine wants done, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Answer a button press so the platform stops its spinner.
    Ack { event_id: String },
    /// Send a new message to the session's chat.
    Send {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Edit a menu message in place.
    Edit {
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Best-effort notification to the broadcast chat. Delivery
    /// failures are logged and swallowed by the dispatcher.
    Broadcast { text: String },
}
