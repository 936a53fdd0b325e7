//! Read-through TTL cache over the catalog sheet.
//!
//! Every read serves from the cached snapshot while it is fresh. Once
//! the TTL elapses the next reader refetches and rebuilds the whole
//! catalog (rebuild, not merge: rows removed upstream vanish here on
//! the next refresh). At most one fetch is in flight at a time;
//! concurrent readers keep getting the previous snapshot, and a reader
//! that has no snapshot at all waits for the fetch to finish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::domain::catalog::{parse_rows, Category, Item};
use crate::domain::foundation::{DomainError, ItemCode};
use crate::ports::RowStore;

struct CacheState {
    categories: Option<Arc<Vec<Category>>>,
    fetched_at: Option<Instant>,
}

impl CacheState {
    fn fresh_snapshot(&self, ttl: Duration) -> Option<Arc<Vec<Category>>> {
        let fetched_at = self.fetched_at?;
        if fetched_at.elapsed() <= ttl {
            self.categories.clone()
        } else {
            None
        }
    }
}

/// TTL-cached view of the hierarchical catalog.
pub struct CatalogCache {
    store: Arc<dyn RowStore>,
    sheet_id: String,
    range: String,
    ttl: Duration,
    state: RwLock<CacheState>,
    /// Held for the duration of a fetch; `try_lock` failure means a
    /// refresh is already in flight.
    refresh_lock: Mutex<()>,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn RowStore>, sheet_id: String, range: String, ttl: Duration) -> Self {
        Self {
            store,
            sheet_id,
            range,
            ttl,
            state: RwLock::new(CacheState {
                categories: None,
                fetched_at: None,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// All categories, in source-row order.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, DomainError> {
        self.snapshot().await
    }

    /// The category at `index`.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` when the index has no corresponding category -
    /// typically a stale menu after a refresh removed rows.
    pub async fn category(&self, index: usize) -> Result<Category, DomainError> {
        let categories = self.snapshot().await?;
        categories
            .get(index)
            .cloned()
            .ok_or_else(|| DomainError::category_not_found(index))
    }

    /// The item `code` inside the category at `index`.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` / `ItemNotFound` for stale selectors.
    pub async fn item(&self, index: usize, code: ItemCode) -> Result<Item, DomainError> {
        let category = self.category(index).await?;
        category
            .item(code)
            .cloned()
            .ok_or_else(|| DomainError::item_not_found(code.as_u32()))
    }

    /// Clears the fetch timestamp so the next read refetches. The
    /// current snapshot keeps serving anyone who reads before then.
    pub async fn force_refresh(&self) {
        let mut state = self.state.write().await;
        state.fetched_at = None;
    }

    async fn snapshot(&self) -> Result<Arc<Vec<Category>>, DomainError> {
        {
            let state = self.state.read().await;
            if let Some(snapshot) = state.fresh_snapshot(self.ttl) {
                return Ok(snapshot);
            }
        }

        match self.refresh_lock.try_lock() {
            Ok(_guard) => {
                // Re-check: the refresh we queued behind may have landed.
                {
                    let state = self.state.read().await;
                    if let Some(snapshot) = state.fresh_snapshot(self.ttl) {
                        return Ok(snapshot);
                    }
                }
                self.refetch().await
            }
            Err(_) => {
                // A fetch is in flight. Serve the previous snapshot if
                // there is one; otherwise wait for the fetch to finish.
                {
                    let state = self.state.read().await;
                    if let Some(snapshot) = state.categories.clone() {
                        return Ok(snapshot);
                    }
                }
                let _guard = self.refresh_lock.lock().await;
                let state = self.state.read().await;
                state
                    .categories
                    .clone()
                    .ok_or_else(|| DomainError::upstream("catalog fetch failed"))
            }
        }
    }

    async fn refetch(&self) -> Result<Arc<Vec<Category>>, DomainError> {
        match self.store.read_range(&self.sheet_id, &self.range).await {
            Ok(rows) => {
                let categories = Arc::new(parse_rows(&rows));
                info!(
                    categories = categories.len(),
                    rows = rows.len(),
                    "catalog cache rebuilt"
                );
                let mut state = self.state.write().await;
                state.categories = Some(categories.clone());
                state.fetched_at = Some(Instant::now());
                Ok(categories)
            }
            Err(err) => {
                // Serve the last good snapshot when we have one.
                let state = self.state.read().await;
                match state.categories.clone() {
                    Some(stale) => {
                        warn!(error = %err, "catalog refresh failed, serving stale snapshot");
                        Ok(stale)
                    }
                    None => Err(err.into()),
                }
            }
        }
    }
}
