//! Append-only order ledger with sequential id allocation.
//!
//! The counter is seeded once, at construction, from the maximum id
//! already present in the remote order log; an in-memory counter is
//! never trusted across process restarts. Two ledger instances racing
//! around a restart can in principle allocate overlapping ids - the
//! remote store is append-only and the single source of truth, so a
//! human can reconcile duplicates after the fact.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{DomainError, OrderId, Timestamp};
use crate::domain::order::{DraftOrder, Order};
use crate::ports::RowStore;

/// Allocates order ids and appends recorded orders to the remote log.
pub struct OrderLedger {
    store: Arc<dyn RowStore>,
    sheet_id: String,
    append_range: String,
    id_width: usize,
    counter: AtomicU64,
}

impl OrderLedger {
    /// Scans the id column of the order log and seeds the counter with
    /// the maximum integer found (0 on an empty log).
    ///
    /// # Errors
    ///
    /// `UpstreamUnavailable` if the id column cannot be read; the
    /// ledger refuses to start on a guessed counter.
    pub async fn init(
        store: Arc<dyn RowStore>,
        sheet_id: String,
        append_range: String,
        id_range: String,
        id_width: usize,
    ) -> Result<Self, DomainError> {
        let rows = store.read_range(&sheet_id, &id_range).await?;
        let seed = rows
            .iter()
            .filter_map(|row| row.first())
            .filter_map(|cell| OrderId::parse_numeric(cell))
            .max()
            .unwrap_or(0);
        info!(seed, "order ledger seeded from remote log");

        Ok(Self {
            store,
            sheet_id,
            append_range,
            id_width,
            counter: AtomicU64::new(seed),
        })
    }

    /// Records a completed draft: allocates the next id, appends one
    /// row to the remote log, and returns the immutable order.
    ///
    /// The increment is atomic so concurrent calls get distinct,
    /// densely sequential ids; the append itself happens outside any
    /// critical section since the store is append-safe. If the append
    /// fails the allocated id is not reused - a gap in the log is
    /// preferable to a duplicate.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if the draft is incomplete;
    /// `UpstreamUnavailable` if the append fails.
    pub async fn record_order(
        &self,
        draft: &DraftOrder,
        item_name: &str,
        customer: &str,
    ) -> Result<Order, DomainError> {
        let value = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = OrderId::from_counter(value, self.id_width);
        let order = Order::assemble(id, draft, item_name, customer, Timestamp::now())?;

        self.store
            .append_row(&self.sheet_id, &self.append_range, &order.to_row())
            .await?;
        info!(order_id = %order.id, customer, "order recorded");
        Ok(order)
    }
}
