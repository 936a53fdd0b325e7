//! Session aggregate: the durable (state, draft) pair tracked per chat.
//!
//! Exactly one session exists per chat. It is created on the first
//! inbound event, reset to idle on completion or abort, and owns its
//! draft exclusively - drafts are never shared across chats.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ChatId;
use crate::domain::order::{DraftOrder, OrderFlowState};

/// One chat's conversation state and accumulated draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    chat: ChatId,
    state: OrderFlowState,
    draft: DraftOrder,
}

impl Session {
    /// Creates an idle session for a chat.
    pub fn new(chat: ChatId) -> Self {
        Self {
            chat,
            state: OrderFlowState::Idle,
            draft: DraftOrder::new(),
        }
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn state(&self) -> OrderFlowState {
        self.state
    }

    pub fn draft(&self) -> &DraftOrder {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftOrder {
        &mut self.draft
    }

    /// Moves the conversation to `state`.
    ///
    /// The engine owns transition legality; the session just records it.
    pub fn set_state(&mut self, state: OrderFlowState) {
        self.state = state;
    }

    /// Returns to idle, discarding the entire draft.
    pub fn reset(&mut self) {
        self.state = OrderFlowState::Idle;
        self.draft.reset();
    }
}
