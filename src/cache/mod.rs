//! Cursor cache: remembers where a list was so the next session resumes there.
//!
//! The server treats `beginID` as exclusive, so the stored id is shifted one
//! position back in the active sort direction. A forward reset from the
//! stored value then starts exactly at the record that was first on screen.

mod store;

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{DEFAULT_CACHE_EXPIRY, RecordId, SortOrder};
use crate::window::Cursor;

pub use store::{CacheStore, FileStore, MemoryStore, cache_dir};

/// What is persisted per list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(rename = "beginID")]
    pub begin_id: String,
    pub sort_order: SortOrder,
    pub saved_at_epoch_ms: i64,
}

impl CacheEntry {
    /// The stored cursor position, ready to hand to [`Cursor::resume`].
    pub fn begin_id(&self) -> Option<RecordId> {
        Cursor::parse_begin_id(&self.begin_id).ok()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.begin_id().map(|id| Cursor::resume(id, self.sort_order))
    }

    pub fn age(&self, now: Timestamp) -> Duration {
        let elapsed = now.as_millisecond().saturating_sub(self.saved_at_epoch_ms);
        Duration::from_millis(elapsed.max(0) as u64)
    }
}

/// Shift the id of the first rendered record so an exclusive forward query
/// includes it again. The sentinel stays the sentinel.
pub fn corrected_begin_id(first_id: RecordId, order: SortOrder) -> RecordId {
    if first_id <= Cursor::SENTINEL {
        return Cursor::SENTINEL;
    }
    match order {
        SortOrder::Asc => first_id - 1,
        SortOrder::Desc => first_id + 1,
    }
}

/// Per-list view over a [`CacheStore`].
#[derive(Clone)]
pub struct CursorCache {
    store: Arc<dyn CacheStore>,
    key: String,
    expiry: Duration,
}

impl CursorCache {
    pub fn new(store: Arc<dyn CacheStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            expiry: DEFAULT_CACHE_EXPIRY,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Persist `first_id` (the first record currently rendered) for `order`.
    pub fn save(&self, first_id: RecordId, order: SortOrder) -> Result<()> {
        self.save_at(first_id, order, Timestamp::now())
    }

    pub fn save_at(&self, first_id: RecordId, order: SortOrder, now: Timestamp) -> Result<()> {
        let entry = CacheEntry {
            begin_id: corrected_begin_id(first_id, order).to_string(),
            sort_order: order,
            saved_at_epoch_ms: now.as_millisecond(),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&self.key, &json)?;
        tracing::debug!(key = %self.key, begin_id = %entry.begin_id, %order, "saved list cursor");
        Ok(())
    }

    /// Read the entry back. Missing, expired, or unreadable entries are `None`.
    pub fn load(&self) -> Option<CacheEntry> {
        self.load_at(Timestamp::now())
    }

    pub fn load_at(&self, now: Timestamp) -> Option<CacheEntry> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(key = %self.key, "cursor cache unreadable: {e}");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key = %self.key, "discarding corrupt cursor cache: {e}");
                return None;
            }
        };

        if entry.begin_id().is_none() {
            tracing::debug!(key = %self.key, begin_id = %entry.begin_id, "discarding invalid cached cursor");
            return None;
        }

        if entry.age(now) > self.expiry {
            tracing::debug!(key = %self.key, "cursor cache expired");
            return None;
        }

        Some(entry)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for CursorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCache")
            .field("key", &self.key)
            .field("expiry", &self.expiry)
            .finish()
    }
}
