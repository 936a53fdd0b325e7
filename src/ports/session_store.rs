//! Session persistence port.
//!
//! Sessions are small and per-chat; implementations only need to
//! guarantee that a chat's session is read and written by one event at
//! a time, which the dispatcher's per-chat serialization provides.

use async_trait::async_trait;

use crate::domain::foundation::{ChatId, DomainError};
use crate::domain::session::Session;

/// Port for loading and saving per-chat sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the chat's session, creating an idle one on first contact.
    async fn load_or_create(&self, chat: ChatId) -> Result<Session, DomainError>;

    /// Persists the session after a handled event.
    async fn save(&self, session: Session) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SessionStore) {}
    }
}
