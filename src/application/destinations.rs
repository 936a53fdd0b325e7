//! Destination directory: TTL-cached names, fuzzy search, recency.
//!
//! Shares the catalog cache's refresh discipline (independent timer).
//! Search matches the query as a whitespace-delimited substring of the
//! name, case-insensitively: the name is padded with boundary spaces so
//! partial-word matches are excluded while multi-word queries matching
//! a contiguous span succeed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::domain::destination::{Destination, Fingerprint, RecentDestinations};
use crate::domain::foundation::DomainError;
use crate::ports::RowStore;

struct DirectoryState {
    destinations: Option<Arc<Vec<Destination>>>,
    fetched_at: Option<Instant>,
}

impl DirectoryState {
    fn fresh_snapshot(&self, ttl: Duration) -> Option<Arc<Vec<Destination>>> {
        let fetched_at = self.fetched_at?;
        if fetched_at.elapsed() <= ttl {
            self.destinations.clone()
        } else {
            None
        }
    }
}

/// TTL-cached destination directory with a process-wide recent list.
pub struct DestinationDirectory {
    store: Arc<dyn RowStore>,
    sheet_id: String,
    range: String,
    ttl: Duration,
    state: RwLock<DirectoryState>,
    refresh_lock: Mutex<()>,
    recent: RwLock<RecentDestinations>,
}

impl DestinationDirectory {
    pub fn new(store: Arc<dyn RowStore>, sheet_id: String, range: String, ttl: Duration) -> Self {
        Self {
            store,
            sheet_id,
            range,
            ttl,
            state: RwLock::new(DirectoryState {
                destinations: None,
                fetched_at: None,
            }),
            refresh_lock: Mutex::new(()),
            recent: RwLock::new(RecentDestinations::new()),
        }
    }

    /// All destinations in source-row order.
    pub async fn all(&self) -> Result<Arc<Vec<Destination>>, DomainError> {
        self.snapshot().await
    }

    /// Destinations whose name contains `query` on word boundaries,
    /// case-insensitively.
    pub async fn search(&self, query: &str) -> Result<Vec<Destination>, DomainError> {
        let needle = normalized_needle(query);
        if needle.trim().is_empty() {
            return Ok(Vec::new());
        }
        let destinations = self.snapshot().await?;
        Ok(destinations
            .iter()
            .filter(|destination| padded_name(destination.name()).contains(&needle))
            .cloned()
            .collect())
    }

    /// Resolves a fingerprint back to its destination.
    ///
    /// # Errors
    ///
    /// `DestinationNotFound` when the fingerprint is absent from the
    /// current cache - a stale button after an upstream edit.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Destination, DomainError> {
        let destinations = self.snapshot().await?;
        destinations
            .iter()
            .find(|destination| destination.fingerprint() == fingerprint)
            .cloned()
            .ok_or_else(|| DomainError::destination_not_found(fingerprint.as_str()))
    }

    /// The recent quick-pick list, most-recent-first.
    pub async fn recent(&self) -> Vec<Destination> {
        self.recent.read().await.iter().cloned().collect()
    }

    /// Resolves the fingerprint and moves-or-inserts it at the front of
    /// the recent list, evicting the oldest entry past the bound.
    pub async fn touch(&self, fingerprint: &Fingerprint) -> Result<Destination, DomainError> {
        let destination = self.get(fingerprint).await?;
        self.recent.write().await.touch(destination.clone());
        Ok(destination)
    }

    /// Clears the fetch timestamp so the next read refetches.
    pub async fn force_refresh(&self) {
        let mut state = self.state.write().await;
        state.fetched_at = None;
    }

    async fn snapshot(&self) -> Result<Arc<Vec<Destination>>, DomainError> {
        {
            let state = self.state.read().await;
            if let Some(snapshot) = state.fresh_snapshot(self.ttl) {
                return Ok(snapshot);
            }
        }

        match self.refresh_lock.try_lock() {
            Ok(_guard) => {
                {
                    let state = self.state.read().await;
                    if let Some(snapshot) = state.fresh_snapshot(self.ttl) {
                        return Ok(snapshot);
                    }
                }
                self.refetch().await
            }
            Err(_) => {
                {
                    let state = self.state.read().await;
                    if let Some(snapshot) = state.destinations.clone() {
                        return Ok(snapshot);
                    }
                }
                let _guard = self.refresh_lock.lock().await;
                let state = self.state.read().await;
                state
                    .destinations
                    .clone()
                    .ok_or_else(|| DomainError::upstream("destination fetch failed"))
            }
        }
    }

    async fn refetch(&self) -> Result<Arc<Vec<Destination>>, DomainError> {
        match self.store.read_range(&self.sheet_id, &self.range).await {
            Ok(rows) => {
                let destinations: Arc<Vec<Destination>> = Arc::new(
                    rows.iter()
                        .filter_map(|row| row.first())
                        .map(|cell| cell.trim())
                        .filter(|name| !name.is_empty())
                        .map(Destination::new)
                        .collect(),
                );
                info!(destinations = destinations.len(), "destination directory rebuilt");
                let mut state = self.state.write().await;
                state.destinations = Some(destinations.clone());
                state.fetched_at = Some(Instant::now());
                Ok(destinations)
            }
            Err(err) => {
                let state = self.state.read().await;
                match state.destinations.clone() {
                    Some(stale) => {
                        warn!(error = %err, "destination refresh failed, serving stale snapshot");
                        Ok(stale)
                    }
                    None => Err(err.into()),
                }
            }
        }
    }
}

/// Lowercased name wrapped in boundary spaces.
fn padded_name(name: &str) -> String {
    format!(" {} ", name.to_lowercase())
}

/// Lowercased query with runs of whitespace collapsed, wrapped in
/// boundary spaces.
fn normalized_needle(query: &str) -> String {
    let collapsed = query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    format!(" {} ", collapsed)
}
