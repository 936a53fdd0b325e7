//! The conversation engine: per-chat state machine dispatch.
//!
//! `handle` resolves the session's current state, applies the
//! transition for the incoming event, and returns the outbound actions
//! to perform. Catalog and destination lookups are read-only; the one
//! side effect is the ledger append at the terminal transition.
//!
//! Input policy: free text that fails the expected pattern for the
//! current state is ignored silently - the engine reacts to well-formed
//! input and otherwise waits for another message. Button presses are
//! always acknowledged, then acted on only if they are semantically
//! valid for the current state; stale selectors surface as `NotFound`
//! and recover by re-rendering the nearest valid menu.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::catalog_cache::CatalogCache;
use crate::application::destinations::DestinationDirectory;
use crate::application::events::{Command, EventKind, InboundEvent, OutboundAction};
use crate::application::ledger::OrderLedger;
use crate::application::menus::{self, CB_BACK, CB_DEST_PREFIX, CB_NEXT, CB_SKIP};
use crate::domain::destination::Fingerprint;
use crate::domain::foundation::{DomainError, ErrorCode, ItemCode};
use crate::domain::order::{parse_count, Deadline, MessageId, OrderFlowState};
use crate::domain::session::Session;
use crate::ports::Keyboard;

/// Drives one session's ordering dialogue.
pub struct ConversationEngine {
    catalog: Arc<CatalogCache>,
    destinations: Arc<DestinationDirectory>,
    ledger: Arc<OrderLedger>,
}

impl ConversationEngine {
    pub fn new(
        catalog: Arc<CatalogCache>,
        destinations: Arc<DestinationDirectory>,
        ledger: Arc<OrderLedger>,
    ) -> Self {
        Self {
            catalog,
            destinations,
            ledger,
        }
    }

    /// Applies one inbound event to the session.
    ///
    /// Mutates the session's state and draft in place and returns the
    /// actions the dispatcher should perform, in order. Recoverable
    /// upstream failures become user-facing retry messages; `Err` is
    /// reserved for conditions the dispatcher can only log.
    pub async fn handle(
        &self,
        session: &mut Session,
        event: InboundEvent,
    ) -> Result<Vec<OutboundAction>, DomainError> {
        let mut actions = Vec::new();

        // Every button press is answered, stale or not, so the platform
        // stops its loading indicator.
        if let EventKind::Button { event_id, .. } = &event.kind {
            actions.push(OutboundAction::Ack {
                event_id: event_id.clone(),
            });
        }

        match event.kind {
            EventKind::Command(command) => {
                self.on_command(session, command, &mut actions).await?;
            }
            EventKind::Text(text) => {
                self.on_text(session, &event.sender, &text, &mut actions)
                    .await?;
            }
            EventKind::Button {
                message_id, data, ..
            } => {
                self.on_button(session, &event.sender, message_id, &data, &mut actions)
                    .await?;
            }
        }

        Ok(actions)
    }

    // ─────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────

    async fn on_command(
        &self,
        session: &mut Session,
        command: Command,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        match command {
            Command::Start => {
                actions.push(send(menus::TXT_GREETING));
            }
            Command::Order => {
                if session.state().is_active() {
                    actions.push(send(menus::TXT_ALREADY_ORDERING));
                    return Ok(());
                }
                match self.catalog.categories().await {
                    Ok(categories) => {
                        session.set_state(OrderFlowState::ChooseCategory);
                        actions.push(send_menu(
                            menus::TXT_CHOOSE_CATEGORY,
                            menus::category_menu(&categories),
                        ));
                    }
                    Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                        warn!(error = %err, "cannot start order, catalog unavailable");
                        actions.push(send(menus::TXT_CATALOG_UNAVAILABLE));
                    }
                    Err(err) => return Err(err),
                }
            }
            Command::Abort => {
                if session.state().is_active() {
                    session.reset();
                    actions.push(send(menus::TXT_ABORTED));
                } else {
                    actions.push(send(menus::TXT_NOTHING_TO_ABORT));
                }
            }
            Command::Refresh => {
                self.catalog.force_refresh().await;
                self.destinations.force_refresh().await;
                actions.push(send(menus::TXT_CACHES_REFRESHED));
            }
            Command::ChatId => {
                actions.push(send(format!("Chat id: {}", session.chat())));
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────
    // Free text
    // ─────────────────────────────────────────────────────────────────

    async fn on_text(
        &self,
        session: &mut Session,
        sender: &str,
        text: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        match session.state() {
            OrderFlowState::ChooseCount => match parse_count(text) {
                Some(count) => {
                    session.draft_mut().count = Some(count);
                    session.set_state(OrderFlowState::SetDeadline);
                    actions.push(send_menu(menus::TXT_ASK_DEADLINE, menus::back_only()));
                }
                None => {
                    debug!(chat = %session.chat(), "ignoring malformed count input");
                }
            },
            OrderFlowState::SetDeadline => match Deadline::parse(text) {
                Some(deadline) => {
                    session.draft_mut().deadline = Some(deadline);
                    session.set_state(OrderFlowState::SetDestination);
                    let recent = self.destinations.recent().await;
                    actions.push(send_menu(
                        menus::TXT_ASK_DESTINATION,
                        menus::destination_menu(&recent),
                    ));
                }
                None => {
                    debug!(chat = %session.chat(), "ignoring malformed deadline input");
                }
            },
            OrderFlowState::SetDestination => match self.destinations.search(text).await {
                Ok(results) if results.is_empty() => {
                    actions.push(send_menu(menus::TXT_NO_MATCHES, menus::back_only()));
                }
                Ok(results) => {
                    actions.push(send_menu(
                        menus::TXT_ASK_DESTINATION,
                        menus::destination_menu(&results),
                    ));
                }
                Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                    warn!(error = %err, "destination search unavailable");
                    actions.push(send(menus::TXT_DIRECTORY_UNAVAILABLE));
                }
                Err(err) => return Err(err),
            },
            OrderFlowState::SetComment => {
                // Stored verbatim.
                session.draft_mut().comment = Some(text.to_string());
                self.finalize(session, sender, actions).await?;
            }
            state => {
                debug!(chat = %session.chat(), ?state, "ignoring free text in button-driven state");
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────
    // Button presses
    // ─────────────────────────────────────────────────────────────────

    async fn on_button(
        &self,
        session: &mut Session,
        sender: &str,
        message_id: MessageId,
        data: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        match session.state() {
            OrderFlowState::ChooseCategory => {
                self.on_category_pick(session, message_id, data, actions).await
            }
            OrderFlowState::ChooseItem => {
                self.on_item_pick(session, message_id, data, actions).await
            }
            OrderFlowState::ConfirmItem => {
                self.on_item_confirm(session, message_id, data, actions).await
            }
            OrderFlowState::ChooseCount => {
                if data == CB_BACK {
                    session.set_state(OrderFlowState::ConfirmItem);
                    self.render_item_details(session, message_id, actions).await
                } else {
                    ignore_stale(session, data);
                    Ok(())
                }
            }
            OrderFlowState::SetDeadline => {
                if data == CB_BACK {
                    session.draft_mut().count = None;
                    session.set_state(OrderFlowState::ChooseCount);
                    actions.push(edit(message_id, menus::TXT_ASK_COUNT, menus::back_only()));
                    Ok(())
                } else {
                    ignore_stale(session, data);
                    Ok(())
                }
            }
            OrderFlowState::SetDestination => {
                self.on_destination_pick(session, message_id, data, actions).await
            }
            OrderFlowState::SetComment => {
                self.on_comment_control(session, sender, message_id, data, actions)
                    .await
            }
            OrderFlowState::Idle => {
                ignore_stale(session, data);
                Ok(())
            }
        }
    }

    async fn on_category_pick(
        &self,
        session: &mut Session,
        message_id: MessageId,
        data: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        let Ok(index) = data.parse::<usize>() else {
            ignore_stale(session, data);
            return Ok(());
        };
        match self.catalog.category(index).await {
            Ok(category) => {
                let draft = session.draft_mut();
                draft.category_index = Some(index);
                draft.pending_message_id = Some(message_id);
                session.set_state(OrderFlowState::ChooseItem);
                actions.push(edit(
                    message_id,
                    menus::TXT_CHOOSE_ITEM,
                    menus::item_menu(&category),
                ));
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                // Stale menu: the category vanished on refresh.
                debug!(index, "category pick went stale, re-rendering category menu");
                self.render_category_menu(session, Some(message_id), actions)
                    .await
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                warn!(error = %err, "catalog unavailable during category pick");
                actions.push(send(menus::TXT_CATALOG_UNAVAILABLE));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn on_item_pick(
        &self,
        session: &mut Session,
        message_id: MessageId,
        data: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        if data == CB_BACK {
            session.draft_mut().category_index = None;
            session.set_state(OrderFlowState::ChooseCategory);
            return self
                .render_category_menu(session, Some(message_id), actions)
                .await;
        }
        let Ok(code) = data.parse::<ItemCode>() else {
            ignore_stale(session, data);
            return Ok(());
        };
        let Some(index) = session.draft().category_index else {
            // Draft lost its category somehow; fall back to the start
            // of the menu flow rather than guessing.
            session.set_state(OrderFlowState::ChooseCategory);
            return self
                .render_category_menu(session, Some(message_id), actions)
                .await;
        };
        match self.catalog.item(index, code).await {
            Ok(item) => {
                let draft = session.draft_mut();
                draft.item_code = Some(code);
                draft.pending_message_id = Some(message_id);
                session.set_state(OrderFlowState::ConfirmItem);
                actions.push(edit(
                    message_id,
                    menus::item_details(&item),
                    menus::confirm_menu(),
                ));
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!(index, code = code.as_u32(), "item pick went stale");
                self.rerender_nearest_menu(session, Some(message_id), actions).await
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                warn!(error = %err, "catalog unavailable during item pick");
                actions.push(send(menus::TXT_CATALOG_UNAVAILABLE));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn on_item_confirm(
        &self,
        session: &mut Session,
        message_id: MessageId,
        data: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        match data {
            CB_BACK => {
                session.draft_mut().item_code = None;
                session.set_state(OrderFlowState::ChooseItem);
                self.rerender_nearest_menu(session, Some(message_id), actions).await
            }
            CB_NEXT => {
                session.set_state(OrderFlowState::ChooseCount);
                // Drop the confirm keyboard from the details message and
                // ask for the quantity in a fresh message.
                actions.push(OutboundAction::Edit {
                    message_id,
                    text: menus::TXT_ITEM_CONFIRMED.to_string(),
                    keyboard: None,
                });
                actions.push(send_menu(menus::TXT_ASK_COUNT, menus::back_only()));
                Ok(())
            }
            _ => {
                ignore_stale(session, data);
                Ok(())
            }
        }
    }

    async fn on_destination_pick(
        &self,
        session: &mut Session,
        message_id: MessageId,
        data: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        if data == CB_BACK {
            session.draft_mut().deadline = None;
            session.set_state(OrderFlowState::SetDeadline);
            actions.push(edit(message_id, menus::TXT_ASK_DEADLINE, menus::back_only()));
            return Ok(());
        }
        let Some(token) = data.strip_prefix(CB_DEST_PREFIX) else {
            ignore_stale(session, data);
            return Ok(());
        };
        match self
            .destinations
            .touch(&Fingerprint::from_token(token))
            .await
        {
            Ok(destination) => {
                let draft = session.draft_mut();
                draft.destination = Some(destination);
                draft.pending_message_id = Some(message_id);
                session.set_state(OrderFlowState::SetComment);
                actions.push(edit(message_id, menus::TXT_ASK_COMMENT, menus::comment_menu()));
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!(token, "destination pick went stale");
                let recent = self.destinations.recent().await;
                actions.push(edit(
                    message_id,
                    menus::TXT_STALE_DESTINATION,
                    menus::destination_menu(&recent),
                ));
                Ok(())
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                warn!(error = %err, "directory unavailable during destination pick");
                actions.push(send(menus::TXT_DIRECTORY_UNAVAILABLE));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn on_comment_control(
        &self,
        session: &mut Session,
        sender: &str,
        message_id: MessageId,
        data: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        match data {
            CB_SKIP => {
                session.draft_mut().comment = Some(String::new());
                actions.push(OutboundAction::Edit {
                    message_id,
                    text: menus::TXT_NO_COMMENT.to_string(),
                    keyboard: None,
                });
                self.finalize(session, sender, actions).await
            }
            CB_BACK => {
                session.draft_mut().destination = None;
                session.set_state(OrderFlowState::SetDestination);
                let recent = self.destinations.recent().await;
                actions.push(edit(
                    message_id,
                    menus::TXT_ASK_DESTINATION,
                    menus::destination_menu(&recent),
                ));
                Ok(())
            }
            _ => {
                ignore_stale(session, data);
                Ok(())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Terminal transition
    // ─────────────────────────────────────────────────────────────────

    /// Records the order and emits the confirmation plus the broadcast
    /// notification. On a record failure the session stays put so the
    /// user can retry; on a stale item the flow rewinds to the item
    /// menu.
    async fn finalize(
        &self,
        session: &mut Session,
        sender: &str,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        let (Some(index), Some(code)) =
            (session.draft().category_index, session.draft().item_code)
        else {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "terminal transition reached without item selection",
            ));
        };

        let item = match self.catalog.item(index, code).await {
            Ok(item) => item,
            Err(err) if err.is_not_found() => {
                debug!(index, code = code.as_u32(), "item vanished before recording");
                session.draft_mut().item_code = None;
                session.draft_mut().comment = None;
                session.set_state(OrderFlowState::ChooseItem);
                actions.push(send(menus::TXT_STALE_ITEM));
                return self.rerender_nearest_menu(session, None, actions).await;
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                warn!(error = %err, "catalog unavailable at terminal transition");
                session.draft_mut().comment = None;
                actions.push(send(menus::TXT_RECORD_FAILED));
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        match self
            .ledger
            .record_order(session.draft(), item.display_name(), sender)
            .await
        {
            Ok(order) => {
                actions.push(send(menus::order_confirmation(order.id.as_str())));
                actions.push(OutboundAction::Broadcast {
                    text: menus::order_notification(
                        order.id.as_str(),
                        &order.item_name,
                        order.count,
                        &order.customer,
                        &order.deadline.to_string(),
                        &order.destination,
                        &order.comment,
                    ),
                });
                session.reset();
                Ok(())
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                // The session stays in SetComment; re-sending the
                // comment retries with a freshly allocated id.
                warn!(error = %err, "order append failed, leaving session for retry");
                session.draft_mut().comment = None;
                actions.push(send(menus::TXT_RECORD_FAILED));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Menu re-rendering fallbacks
    // ─────────────────────────────────────────────────────────────────

    /// Renders the category menu, editing `message_id` when given.
    async fn render_category_menu(
        &self,
        session: &mut Session,
        message_id: Option<MessageId>,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        match self.catalog.categories().await {
            Ok(categories) => {
                session.set_state(OrderFlowState::ChooseCategory);
                session.draft_mut().category_index = None;
                let keyboard = menus::category_menu(&categories);
                actions.push(match message_id {
                    Some(message_id) => edit(message_id, menus::TXT_CHOOSE_CATEGORY, keyboard),
                    None => send_menu(menus::TXT_CHOOSE_CATEGORY, keyboard),
                });
                Ok(())
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                warn!(error = %err, "catalog unavailable while re-rendering categories");
                actions.push(send(menus::TXT_CATALOG_UNAVAILABLE));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Renders the item menu for the draft's category, falling back to
    /// the category menu when that category is itself gone. Edits
    /// `message_id` in place when given, sends fresh otherwise.
    async fn rerender_nearest_menu(
        &self,
        session: &mut Session,
        message_id: Option<MessageId>,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        if let Some(index) = session.draft().category_index {
            match self.catalog.category(index).await {
                Ok(category) => {
                    session.set_state(OrderFlowState::ChooseItem);
                    let keyboard = menus::item_menu(&category);
                    actions.push(match message_id {
                        Some(message_id) => edit(message_id, menus::TXT_CHOOSE_ITEM, keyboard),
                        None => send_menu(menus::TXT_CHOOSE_ITEM, keyboard),
                    });
                    return Ok(());
                }
                Err(err) if err.is_not_found() => {
                    debug!(index, "category vanished, falling back to category menu");
                }
                Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                    warn!(error = %err, "catalog unavailable while re-rendering items");
                    actions.push(send(menus::TXT_CATALOG_UNAVAILABLE));
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        self.render_category_menu(session, message_id, actions).await
    }

    /// Re-renders the chosen item's details with the confirm menu.
    async fn render_item_details(
        &self,
        session: &mut Session,
        message_id: MessageId,
        actions: &mut Vec<OutboundAction>,
    ) -> Result<(), DomainError> {
        let (Some(index), Some(code)) =
            (session.draft().category_index, session.draft().item_code)
        else {
            session.set_state(OrderFlowState::ChooseCategory);
            return self
                .render_category_menu(session, Some(message_id), actions)
                .await;
        };
        match self.catalog.item(index, code).await {
            Ok(item) => {
                actions.push(edit(
                    message_id,
                    menus::item_details(&item),
                    menus::confirm_menu(),
                ));
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                session.draft_mut().item_code = None;
                session.set_state(OrderFlowState::ChooseItem);
                self.rerender_nearest_menu(session, Some(message_id), actions).await
            }
            Err(err) if err.code == ErrorCode::UpstreamUnavailable => {
                warn!(error = %err, "catalog unavailable while re-rendering item details");
                actions.push(send(menus::TXT_CATALOG_UNAVAILABLE));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

fn send(text: impl Into<String>) -> OutboundAction {
    OutboundAction::Send {
        text: text.into(),
        keyboard: None,
    }
}

fn send_menu(text: impl Into<String>, keyboard: Keyboard) -> OutboundAction {
    OutboundAction::Send {
        text: text.into(),
        keyboard: Some(keyboard),
    }
}

fn edit(message_id: MessageId, text: impl Into<String>, keyboard: Keyboard) -> OutboundAction {
    OutboundAction::Edit {
        message_id,
        text: text.into(),
        keyboard: Some(keyboard),
    }
}

fn ignore_stale(session: &Session, data: &str) {
    debug!(chat = %session.chat(), state = ?session.state(), data, "ignoring stale button payload");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::adapters::memory::InMemoryRowStore;
    use crate::application::menus::{TXT_ABORTED, TXT_CATALOG_UNAVAILABLE, TXT_RECORD_FAILED};
    use crate::domain::foundation::ChatId;

    const CATALOG: &str = "catalog-sheet";
    const ORDERS: &str = "orders-sheet";
    const DESTINATIONS: &str = "dest-sheet";

    struct Fixture {
        engine: ConversationEngine,
        store: Arc<InMemoryRowStore>,
        directory: Arc<DestinationDirectory>,
        session: Session,
    }

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryRowStore::new());
        store
            .put_sheet(
                CATALOG,
                rows(&[
                    &["Category: Ropes"],
                    &["", "101", "Climbing rope \"Alpine\""],
                    &["", "102", "Static rope"],
                    &["Category: Hardware"],
                    &["", "201", "Carabiner \"Lock\""],
                ]),
            )
            .await;
        store.put_sheet(ORDERS, rows(&[&["00042"]])).await;
        store
            .put_sheet(DESTINATIONS, rows(&[&["City Hall"], &["North Depot"]]))
            .await;

        let catalog = Arc::new(CatalogCache::new(
            store.clone(),
            CATALOG.to_string(),
            "items!A3:C200".to_string(),
            Duration::from_secs(60),
        ));
        let directory = Arc::new(DestinationDirectory::new(
            store.clone(),
            DESTINATIONS.to_string(),
            "destinations!A2:A".to_string(),
            Duration::from_secs(60),
        ));
        let ledger = Arc::new(
            OrderLedger::init(
                store.clone(),
                ORDERS.to_string(),
                "orders!A2:I".to_string(),
                "orders!A2:A".to_string(),
                5,
            )
            .await
            .unwrap(),
        );

        Fixture {
            engine: ConversationEngine::new(catalog, directory.clone(), ledger),
            store,
            directory,
            session: Session::new(ChatId::new(7)),
        }
    }

    impl Fixture {
        async fn handle(&mut self, event: InboundEvent) -> Vec<OutboundAction> {
            self.engine.handle(&mut self.session, event).await.unwrap()
        }

        async fn command(&mut self, command: Command) -> Vec<OutboundAction> {
            self.handle(InboundEvent::command(self.session.chat(), "E. Petrov", command))
                .await
        }

        async fn text(&mut self, text: &str) -> Vec<OutboundAction> {
            self.handle(InboundEvent::text(self.session.chat(), "E. Petrov", text))
                .await
        }

        async fn button(&mut self, data: &str) -> Vec<OutboundAction> {
            self.handle(InboundEvent::button(
                self.session.chat(),
                "E. Petrov",
                "cb-1",
                10,
                data,
            ))
            .await
        }

        /// Drives the conversation forward until `target` is reached.
        async fn advance_to(&mut self, target: OrderFlowState) {
            use OrderFlowState::*;
            for next in [
                ChooseCategory,
                ChooseItem,
                ConfirmItem,
                ChooseCount,
                SetDeadline,
                SetDestination,
                SetComment,
            ] {
                if self.session.state() == target {
                    return;
                }
                match next {
                    ChooseCategory => self.command(Command::Order).await,
                    ChooseItem => self.button("0").await,
                    ConfirmItem => self.button("101").await,
                    ChooseCount => self.button(CB_NEXT).await,
                    SetDeadline => self.text("3").await,
                    SetDestination => self.text("28.02").await,
                    SetComment => {
                        let data = format!("{}{}", CB_DEST_PREFIX, Fingerprint::of("City Hall"));
                        self.button(&data).await
                    }
                    Idle => unreachable!(),
                };
            }
            assert_eq!(self.session.state(), target, "failed to drive to {:?}", target);
        }
    }

    fn sent_texts(actions: &[OutboundAction]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|action| match action {
                OutboundAction::Send { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn has_ack(actions: &[OutboundAction]) -> bool {
        actions
            .iter()
            .any(|action| matches!(action, OutboundAction::Ack { .. }))
    }

    // ─── Forward path ────────────────────────────────────────────────

    #[tokio::test]
    async fn order_command_opens_category_menu() {
        let mut fx = fixture().await;
        let actions = fx.command(Command::Order).await;

        assert_eq!(fx.session.state(), OrderFlowState::ChooseCategory);
        assert!(matches!(
            &actions[0],
            OutboundAction::Send { keyboard: Some(k), .. } if k.rows.len() == 2
        ));
    }

    #[tokio::test]
    async fn full_flow_records_order_and_resets_session() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetComment).await;
        let actions = fx.text("leave at the gate").await;

        assert_eq!(fx.session.state(), OrderFlowState::Idle);
        assert_eq!(fx.session.draft(), &crate::domain::order::DraftOrder::default());

        // Confirmation to the requester plus broadcast notification.
        assert!(sent_texts(&actions)
            .iter()
            .any(|text| text.contains("#00043")));
        assert!(actions.iter().any(|action| matches!(
            action,
            OutboundAction::Broadcast { text } if text.contains("Alpine") && text.contains("leave at the gate")
        )));

        // Exactly one row appended to the order log.
        let appended = fx.store.rows(ORDERS).await;
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[1][0], "00043");
        assert_eq!(appended[1][7], "City Hall");
    }

    #[tokio::test]
    async fn skip_button_records_with_empty_comment() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetComment).await;
        let actions = fx.button(CB_SKIP).await;

        assert_eq!(fx.session.state(), OrderFlowState::Idle);
        assert!(has_ack(&actions));
        let appended = fx.store.rows(ORDERS).await;
        assert_eq!(appended[1][8], "");
    }

    #[tokio::test]
    async fn selecting_destination_touches_recent_list() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetComment).await;

        let recent = fx.directory.recent().await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name(), "City Hall");
    }

    #[tokio::test]
    async fn destination_search_renders_results_without_transition() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetDestination).await;

        let actions = fx.text("hall").await;

        assert_eq!(fx.session.state(), OrderFlowState::SetDestination);
        assert!(matches!(
            &actions[0],
            OutboundAction::Send { keyboard: Some(k), .. }
                if k.rows[0][0].data.starts_with(CB_DEST_PREFIX)
        ));
    }

    // ─── Back navigation ─────────────────────────────────────────────

    #[tokio::test]
    async fn back_from_item_menu_clears_category() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ChooseItem).await;
        assert_eq!(fx.session.draft().category_index, Some(0));

        fx.button(CB_BACK).await;

        assert_eq!(fx.session.state(), OrderFlowState::ChooseCategory);
        assert_eq!(fx.session.draft().category_index, None);
    }

    #[tokio::test]
    async fn back_from_confirm_clears_item_code() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ConfirmItem).await;
        assert!(fx.session.draft().item_code.is_some());

        fx.button(CB_BACK).await;

        assert_eq!(fx.session.state(), OrderFlowState::ChooseItem);
        assert_eq!(fx.session.draft().item_code, None);
        // The category survives: back only unwinds one step.
        assert_eq!(fx.session.draft().category_index, Some(0));
    }

    #[tokio::test]
    async fn back_from_count_returns_to_confirmation() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ChooseCount).await;

        fx.button(CB_BACK).await;

        assert_eq!(fx.session.state(), OrderFlowState::ConfirmItem);
        assert!(fx.session.draft().item_code.is_some());
    }

    #[tokio::test]
    async fn back_from_deadline_clears_count() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetDeadline).await;
        assert_eq!(fx.session.draft().count, Some(3));

        fx.button(CB_BACK).await;

        assert_eq!(fx.session.state(), OrderFlowState::ChooseCount);
        assert_eq!(fx.session.draft().count, None);
    }

    #[tokio::test]
    async fn back_from_destination_clears_deadline() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetDestination).await;
        assert!(fx.session.draft().deadline.is_some());

        fx.button(CB_BACK).await;

        assert_eq!(fx.session.state(), OrderFlowState::SetDeadline);
        assert_eq!(fx.session.draft().deadline, None);
        // Unrelated fields stay put.
        assert_eq!(fx.session.draft().count, Some(3));
        assert!(fx.session.draft().item_code.is_some());
    }

    #[tokio::test]
    async fn back_from_comment_clears_destination() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetComment).await;
        assert!(fx.session.draft().destination.is_some());

        fx.button(CB_BACK).await;

        assert_eq!(fx.session.state(), OrderFlowState::SetDestination);
        assert_eq!(fx.session.draft().destination, None);
        assert!(fx.session.draft().deadline.is_some());
    }

    // ─── Abort ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn abort_resets_from_every_active_state() {
        use OrderFlowState::*;
        for target in [
            ChooseCategory,
            ChooseItem,
            ConfirmItem,
            ChooseCount,
            SetDeadline,
            SetDestination,
            SetComment,
        ] {
            let mut fx = fixture().await;
            fx.advance_to(target).await;

            let actions = fx.command(Command::Abort).await;

            assert_eq!(fx.session.state(), Idle, "abort from {:?}", target);
            assert_eq!(
                fx.session.draft(),
                &crate::domain::order::DraftOrder::default(),
                "draft after abort from {:?}",
                target
            );
            assert_eq!(sent_texts(&actions), vec![TXT_ABORTED]);
        }
    }

    #[tokio::test]
    async fn abort_when_idle_is_a_polite_no_op() {
        let mut fx = fixture().await;
        let actions = fx.command(Command::Abort).await;
        assert_eq!(fx.session.state(), OrderFlowState::Idle);
        assert_eq!(actions.len(), 1);
    }

    // ─── Malformed input ─────────────────────────────────────────────

    #[tokio::test]
    async fn malformed_count_is_silently_ignored() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ChooseCount).await;

        for input in ["three", "3x", "-2", ""] {
            let actions = fx.text(input).await;
            assert!(actions.is_empty(), "input {:?} produced actions", input);
            assert_eq!(fx.session.state(), OrderFlowState::ChooseCount);
            assert_eq!(fx.session.draft().count, None);
        }
    }

    #[tokio::test]
    async fn malformed_deadline_is_silently_ignored() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetDeadline).await;

        for input in ["tomorrow", "32.01", "5.3"] {
            let actions = fx.text(input).await;
            assert!(actions.is_empty(), "input {:?} produced actions", input);
            assert_eq!(fx.session.state(), OrderFlowState::SetDeadline);
        }
    }

    #[tokio::test]
    async fn free_text_in_menu_states_is_ignored() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ChooseCategory).await;

        let actions = fx.text("hello?").await;
        assert!(actions.is_empty());
        assert_eq!(fx.session.state(), OrderFlowState::ChooseCategory);
    }

    // ─── Stale menus and failures ────────────────────────────────────

    #[tokio::test]
    async fn stale_category_pick_rerenders_category_menu() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ChooseCategory).await;

        let actions = fx.button("9").await;

        assert!(has_ack(&actions));
        assert_eq!(fx.session.state(), OrderFlowState::ChooseCategory);
        assert!(actions.iter().any(|action| matches!(
            action,
            OutboundAction::Edit { text, .. } if text == menus::TXT_CHOOSE_CATEGORY
        )));
    }

    #[tokio::test]
    async fn stale_button_in_idle_is_only_acked() {
        let mut fx = fixture().await;
        let actions = fx.button("101").await;

        assert_eq!(actions.len(), 1);
        assert!(has_ack(&actions));
        assert_eq!(fx.session.state(), OrderFlowState::Idle);
    }

    #[tokio::test]
    async fn foreign_payload_in_menu_state_is_only_acked() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::ChooseCategory).await;

        // A leftover confirm button from an older conversation.
        let actions = fx.button(CB_NEXT).await;

        assert_eq!(actions.len(), 1);
        assert!(has_ack(&actions));
        assert_eq!(fx.session.state(), OrderFlowState::ChooseCategory);
    }

    #[tokio::test]
    async fn order_command_with_catalog_down_reports_and_stays_idle() {
        let mut fx = fixture().await;
        fx.store.remove_sheet(CATALOG).await;

        let actions = fx.command(Command::Order).await;

        assert_eq!(fx.session.state(), OrderFlowState::Idle);
        assert_eq!(sent_texts(&actions), vec![TXT_CATALOG_UNAVAILABLE]);
    }

    #[tokio::test]
    async fn record_failure_leaves_session_in_comment_step() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetComment).await;
        fx.store.remove_sheet(ORDERS).await;

        let actions = fx.text("urgent").await;

        assert_eq!(fx.session.state(), OrderFlowState::SetComment);
        assert_eq!(fx.session.draft().comment, None);
        assert!(fx.session.draft().destination.is_some());
        assert_eq!(sent_texts(&actions), vec![TXT_RECORD_FAILED]);
    }

    #[tokio::test]
    async fn vanished_item_at_terminal_rewinds_to_item_menu() {
        let mut fx = fixture().await;
        fx.advance_to(OrderFlowState::SetComment).await;

        // The item disappears upstream and the cache is refreshed.
        fx.store
            .put_sheet(CATALOG, rows(&[&["Category: Ropes"], &["", "102", "Static rope"]]))
            .await;
        fx.command(Command::Refresh).await;

        fx.text("urgent").await;

        assert_eq!(fx.session.state(), OrderFlowState::ChooseItem);
        assert_eq!(fx.session.draft().item_code, None);
        // No order row was appended.
        assert_eq!(fx.store.rows(ORDERS).await.len(), 1);
    }

    // ─── Administrative surface ──────────────────────────────────────

    #[tokio::test]
    async fn refresh_command_forces_both_caches_to_refetch() {
        let mut fx = fixture().await;
        fx.command(Command::Order).await;

        // Upstream changes would normally sit behind the TTL.
        fx.store
            .put_sheet(CATALOG, rows(&[&["Category: New"], &["", "301", "Widget"]]))
            .await;
        fx.command(Command::Abort).await;
        fx.command(Command::Refresh).await;

        let actions = fx.command(Command::Order).await;
        assert!(matches!(
            &actions[0],
            OutboundAction::Send { keyboard: Some(k), .. }
                if k.rows.len() == 1 && k.rows[0][0].label == "New"
        ));
    }

    #[tokio::test]
    async fn chat_id_command_reports_session_id() {
        let mut fx = fixture().await;
        let actions = fx.command(Command::ChatId).await;
        assert_eq!(sent_texts(&actions), vec!["Chat id: 7"]);
    }
}
