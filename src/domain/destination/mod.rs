//! Delivery destinations and recency tracking.
//!
//! Destinations are identified by a content-derived fingerprint instead
//! of their raw name so button callback payloads stay short. The
//! fingerprint is a pure function of the name: the same name hashes the
//! same way on every refresh, so a selection survives a re-fetch even if
//! row order changes upstream.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of entries the recent list retains.
pub const RECENT_CAPACITY: usize = 6;

/// Opaque selection token for a destination: first 8 bytes of the
/// SHA-256 of its name, lower-hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a destination name.
    pub fn of(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut hex = String::with_capacity(16);
        for byte in &digest[..8] {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    /// Wraps an already-computed fingerprint (e.g. from callback data).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivery destination with its selection token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    name: String,
    fingerprint: Fingerprint,
}

impl Destination {
    /// Builds a destination, computing its fingerprint from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let fingerprint = Fingerprint::of(&name);
        Self { name, fingerprint }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// Bounded most-recently-used list of destinations, newest first.
///
/// Re-touching a present entry moves it to the front instead of
/// duplicating it; the oldest entry past the bound is evicted.
#[derive(Debug, Clone, Default)]
pub struct RecentDestinations {
    entries: VecDeque<Destination>,
}

impl RecentDestinations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves-or-inserts `destination` at the front.
    pub fn touch(&mut self, destination: Destination) {
        self.entries
            .retain(|entry| entry.fingerprint() != destination.fingerprint());
        self.entries.push_front(destination);
        self.entries.truncate(RECENT_CAPACITY);
    }

    /// Entries ordered most-recent-first.
    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
