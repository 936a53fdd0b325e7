//! Event dispatcher: per-session serialization, cross-session
//! concurrency.
//!
//! Each chat gets its own worker task fed by its own channel, so events
//! within a session are processed strictly in arrival order while a
//! slow remote call for one chat never stalls another. The dispatcher
//! also performs the engine's outbound actions: delivery failures are
//! logged, and only the broadcast notification is fire-and-forget.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::application::engine::ConversationEngine;
use crate::application::events::{InboundEvent, OutboundAction};
use crate::domain::foundation::ChatId;
use crate::ports::{Messenger, SessionStore};

/// Buffered events per chat before backpressure kicks in.
const WORKER_QUEUE_DEPTH: usize = 32;

/// Routes inbound events to per-chat workers and performs the engine's
/// outbound actions.
pub struct Dispatcher {
    engine: Arc<ConversationEngine>,
    sessions: Arc<dyn SessionStore>,
    messenger: Arc<dyn Messenger>,
    broadcast_chat: ChatId,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<ConversationEngine>,
        sessions: Arc<dyn SessionStore>,
        messenger: Arc<dyn Messenger>,
        broadcast_chat: ChatId,
    ) -> Self {
        Self {
            engine,
            sessions,
            messenger,
            broadcast_chat,
        }
    }

    /// Consumes the inbound event stream until it closes.
    ///
    /// Workers are spawned lazily on a chat's first event and live for
    /// the rest of the run.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent>) {
        let mut workers: HashMap<ChatId, mpsc::Sender<InboundEvent>> = HashMap::new();

        while let Some(event) = events.recv().await {
            let chat = event.chat;
            let worker = workers
                .entry(chat)
                .or_insert_with(|| self.clone().spawn_worker(chat));
            if worker.send(event).await.is_err() {
                // Worker died (panic in an adapter); replace it.
                error!(%chat, "session worker lost, respawning");
                let replacement = self.clone().spawn_worker(chat);
                workers.insert(chat, replacement);
            }
        }
        debug!("inbound event stream closed, dispatcher stopping");
    }

    fn spawn_worker(self: Arc<Self>, chat: ChatId) -> mpsc::Sender<InboundEvent> {
        let (tx, mut rx) = mpsc::channel::<InboundEvent>(WORKER_QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.process(event).await;
            }
            debug!(%chat, "session worker finished");
        });
        tx
    }

    /// Handles one event end to end: load session, run the engine,
    /// save, deliver. Public so tests (and simple embedders) can drive
    /// events synchronously without the worker machinery.
    pub async fn process(&self, event: InboundEvent) {
        let chat = event.chat;
        let mut session = match self.sessions.load_or_create(chat).await {
            Ok(session) => session,
            Err(err) => {
                error!(%chat, error = %err, "failed to load session");
                return;
            }
        };

        match self.engine.handle(&mut session, event).await {
            Ok(actions) => {
                if let Err(err) = self.sessions.save(session).await {
                    error!(%chat, error = %err, "failed to save session");
                }
                self.deliver(chat, actions).await;
            }
            Err(err) => {
                // The engine already turned recoverable failures into
                // user-facing actions; anything surfacing here is a bug
                // or a dead upstream. The session is left as loaded.
                error!(%chat, error = %err, "engine failed to handle event");
            }
        }
    }

    async fn deliver(&self, chat: ChatId, actions: Vec<OutboundAction>) {
        for action in actions {
            match action {
                OutboundAction::Ack { event_id } => {
                    if let Err(err) = self.messenger.acknowledge(&event_id).await {
                        warn!(%chat, error = %err, "failed to acknowledge button press");
                    }
                }
                OutboundAction::Send { text, keyboard } => {
                    if let Err(err) = self
                        .messenger
                        .send_message(chat, &text, keyboard.as_ref())
                        .await
                    {
                        warn!(%chat, error = %err, "failed to send message");
                    }
                }
                OutboundAction::Edit {
                    message_id,
                    text,
                    keyboard,
                } => {
                    if let Err(err) = self
                        .messenger
                        .edit_message(chat, message_id, &text, keyboard.as_ref())
                        .await
                    {
                        warn!(%chat, error = %err, "failed to edit message");
                    }
                }
                OutboundAction::Broadcast { text } => {
                    // Best effort: one attempt, failure logged, the
                    // already-recorded order is not rolled back and the
                    // requester sees no error.
                    if let Err(err) = self
                        .messenger
                        .send_message(self.broadcast_chat, &text, None)
                        .await
                    {
                        warn!(error = %err, "broadcast notification failed");
                    }
                }
            }
        }
    }
}
