//! The bounded, in-memory slice of a collection currently rendered.
//!
//! A [`Window`] only changes through [`merge`], which is a pure function of
//! the current window and a fetched page. The engine owns one window per list
//! and swaps it wholesale on every merge.

pub mod cursor;
pub mod merge;

use std::collections::HashSet;

use crate::types::{Record, RecordId, SortOrder};

pub use cursor::Cursor;
pub use merge::{MergeContext, Merged, merge, replace_with_search};

/// Ordered, duplicate-free records plus edge-exhaustion flags.
#[derive(Debug, Clone)]
pub struct Window<R> {
    items: Vec<R>,
    has_more_top: bool,
    has_more_bottom: bool,
    total: u64,
    /// Set when an upward fetch produced nothing new. Cleared by a reset or
    /// when records are trimmed off the top.
    top_exhausted: bool,
    /// Same as `top_exhausted`, for the bottom edge.
    bottom_exhausted: bool,
}

impl<R> Default for Window<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            has_more_top: false,
            has_more_bottom: false,
            total: 0,
            top_exhausted: false,
            bottom_exhausted: false,
        }
    }
}

impl<R: Record> Window<R> {
    /// An empty window, as created at mount.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a window from already-ordered records.
    pub fn with_items(items: Vec<R>, has_more_top: bool, has_more_bottom: bool, total: u64) -> Self {
        Self {
            items,
            has_more_top,
            has_more_bottom,
            total,
            top_exhausted: false,
            bottom_exhausted: false,
        }
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn into_items(self) -> Vec<R> {
        self.items
    }

    pub fn has_more_top(&self) -> bool {
        self.has_more_top
    }

    pub fn has_more_bottom(&self) -> bool {
        self.has_more_bottom
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first_id(&self) -> Option<RecordId> {
        self.items.first().map(Record::record_id)
    }

    pub fn last_id(&self) -> Option<RecordId> {
        self.items.last().map(Record::record_id)
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.items.iter().map(Record::record_id).collect()
    }

    pub fn id_set(&self) -> HashSet<RecordId> {
        self.items.iter().map(Record::record_id).collect()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.items.iter().any(|r| r.record_id() == id)
    }

    /// Whether the items are strictly ordered for `order` (which also rules
    /// out duplicates).
    pub fn is_ordered(&self, order: SortOrder) -> bool {
        self.items
            .windows(2)
            .all(|pair| order.precedes(pair[0].record_id(), pair[1].record_id()))
    }

    /// Drop a record that was deleted elsewhere. Returns whether it was present.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.record_id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.total = self.total.saturating_sub(1);
        }
        removed
    }

    /// Both edges closed, as while a search result is shown.
    pub(crate) fn close_edges(&mut self) {
        self.has_more_top = false;
        self.has_more_bottom = false;
    }
}
