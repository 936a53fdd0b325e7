//! In-memory session store for testing and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ChatId, DomainError};
use crate::domain::session::Session;
use crate::ports::SessionStore;

/// Sessions held in a process-local map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<ChatId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked sessions, for assertions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_or_create(&self, chat: ChatId) -> Result<Session, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .entry(chat)
            .or_insert_with(|| Session::new(chat))
            .clone())
    }

    async fn save(&self, session: Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.chat(), session);
        Ok(())
    }
}
