//! Recording messenger for testing and development.
//!
//! Captures every outbound call so tests can assert on delivered
//! traffic, and can be scripted to fail sends to exercise the
//! best-effort paths.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ChatId;
use crate::domain::order::MessageId;
use crate::ports::{Keyboard, Messenger, TransportError};

/// One captured outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent {
        chat: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edited {
        chat: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Acknowledged {
        event_id: String,
    },
}

/// Messenger that records instead of delivering.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    deliveries: Arc<RwLock<Vec<Delivery>>>,
    next_message_id: AtomicI64,
    fail_sends_to: RwLock<Option<ChatId>>,
    fail_all: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in order.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.read().await.clone()
    }

    /// Texts of sent (not edited) messages to `chat`, in order.
    pub async fn sent_texts(&self, chat: ChatId) -> Vec<String> {
        self.deliveries
            .read()
            .await
            .iter()
            .filter_map(|delivery| match delivery {
                Delivery::Sent { chat: c, text, .. } if *c == chat => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Scripts send failures for one chat (e.g. the broadcast chat).
    pub async fn fail_sends_to(&self, chat: ChatId) {
        *self.fail_sends_to.write().await = Some(chat);
    }

    /// Scripts failure of every call.
    pub fn fail_all(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    async fn check_send(&self, chat: ChatId) -> Result<(), TransportError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("scripted outage".to_string()));
        }
        if *self.fail_sends_to.read().await == Some(chat) {
            return Err(TransportError::Rejected(format!(
                "scripted rejection for chat {}",
                chat
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        self.check_send(chat).await?;
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.deliveries.write().await.push(Delivery::Sent {
            chat,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        self.check_send(chat).await?;
        self.deliveries.write().await.push(Delivery::Edited {
            chat,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn acknowledge(&self, event_id: &str) -> Result<(), TransportError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("scripted outage".to_string()));
        }
        self.deliveries.write().await.push(Delivery::Acknowledged {
            event_id: event_id.to_string(),
        });
        Ok(())
    }
}
