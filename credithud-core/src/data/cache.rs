//! Time-bounded memoization of fetched tables.
//!
//! Entries are keyed by source location and carry an explicit expiry
//! instant. The cache is owned by its caller (one per session or per
//! process shell); there is no global state. Failed fetches are never cached.

use super::provider::{SourceError, SourceFetcher};
use super::table::Table;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default validity window for a fetched table (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<Table>,
    /// `None` when the TTL is too large to represent; the entry never expires.
    expires_at: Option<Instant>,
    fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |t| now < t)
    }
}

/// Snapshot of one cache entry, for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub location: String,
    pub fetched_at: DateTime<Utc>,
    /// `None` for an entry that never expires.
    pub remaining: Option<Duration>,
    pub rows: usize,
}

/// Location-keyed table cache with a fixed TTL.
#[derive(Debug)]
pub struct SourceCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached table for `location`, fetching it when absent or
    /// expired.
    pub fn get_or_fetch(
        &mut self,
        fetcher: &dyn SourceFetcher,
        location: &str,
    ) -> Result<Arc<Table>, SourceError> {
        self.get_or_fetch_at(fetcher, location, Instant::now())
    }

    /// `get_or_fetch` against an explicit clock reading.
    pub fn get_or_fetch_at(
        &mut self,
        fetcher: &dyn SourceFetcher,
        location: &str,
        now: Instant,
    ) -> Result<Arc<Table>, SourceError> {
        if let Some(table) = self.get_at(location, now) {
            tracing::debug!(%location, "source cache hit");
            return Ok(table);
        }

        tracing::info!(%location, fetcher = fetcher.name(), "fetching source");
        let table = Arc::new(fetcher.fetch(location)?);
        tracing::info!(
            %location,
            rows = table.row_count(),
            columns = table.column_count(),
            fingerprint = %table.fingerprint(),
            "source fetched"
        );

        self.entries.insert(
            location.to_string(),
            CacheEntry {
                table: Arc::clone(&table),
                expires_at: now.checked_add(self.ttl),
                fetched_at: Utc::now(),
            },
        );
        Ok(table)
    }

    /// Cached table if present and still valid at `now`. Expired entries
    /// are left in place until the next fetch or invalidation.
    pub fn get_at(&self, location: &str, now: Instant) -> Option<Arc<Table>> {
        self.entries
            .get(location)
            .filter(|e| e.is_valid_at(now))
            .map(|e| Arc::clone(&e.table))
    }

    /// Drop the entry for `location`. Returns whether one existed.
    pub fn invalidate(&mut self, location: &str) -> bool {
        let removed = self.entries.remove(location).is_some();
        if removed {
            tracing::debug!(%location, "source cache entry invalidated");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self, location: &str, now: Instant) -> Option<CacheStatus> {
        self.entries.get(location).map(|e| CacheStatus {
            location: location.to_string(),
            fetched_at: e.fetched_at,
            remaining: e.expires_at.map(|t| t.saturating_duration_since(now)),
            rows: e.table.row_count(),
        })
    }
}
