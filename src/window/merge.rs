//! Combining a fetched page with the current window.
//!
//! Exhaustion is decided here as well: an edge closes when the server says
//! there is nothing further, and also when a whole page turns out to be
//! records the window already holds. The second signal wins over a stale
//! `has_next`.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::api::Page;
use crate::types::{Edge, FetchMode, Record, RecordId, SortOrder};

use super::{Cursor, Window};

/// Inputs a merge needs besides the two operands.
#[derive(Debug, Clone, Copy)]
pub struct MergeContext {
    /// The cursor the page was fetched with. Carries the sort order.
    pub cursor: Cursor,
    pub max_window: usize,
}

/// Result of a merge.
#[derive(Debug, Clone)]
pub struct Merged<R> {
    pub window: Window<R>,
    /// Records from the page that were new to the window.
    pub absorbed: usize,
    /// Records dropped from the opposite edge to respect `max_window`.
    pub trimmed: usize,
}

impl<R> Merged<R> {
    fn unchanged(window: Window<R>) -> Self {
        Self {
            window,
            absorbed: 0,
            trimmed: 0,
        }
    }
}

/// Combine `page` with `current` according to `mode`.
pub fn merge<R: Record>(
    current: Window<R>,
    page: Page<R>,
    mode: FetchMode,
    ctx: &MergeContext,
) -> Merged<R> {
    let max_window = ctx.max_window.max(1);
    let order = ctx.cursor.order();

    match mode {
        FetchMode::Reset => merge_reset(page, &ctx.cursor, max_window),
        FetchMode::Extend(Edge::Top) => merge_top(current, page, order, max_window),
        FetchMode::Extend(Edge::Bottom) => merge_bottom(current, page, order, max_window),
    }
}

/// Window showing a search result: every record, no pagination.
pub fn replace_with_search<R: Record>(records: Vec<R>) -> Window<R> {
    let mut seen = HashSet::new();
    let items: Vec<R> = records
        .into_iter()
        .filter(|r| seen.insert(r.record_id()))
        .collect();
    let total = items.len() as u64;

    Window::with_items(items, false, false, total)
}

fn merge_reset<R: Record>(page: Page<R>, cursor: &Cursor, max_window: usize) -> Merged<R> {
    let mut items = normalize(page.records, cursor.order());
    if items.is_empty() {
        if cursor.is_sentinel() {
            return Merged::unchanged(Window::default());
        }
        // A resumed cursor past the end of the list: records may still
        // exist above it.
        return Merged::unchanged(Window {
            has_more_top: true,
            total: page.total.unwrap_or(0),
            ..Window::default()
        });
    }

    let trimmed = items.len().saturating_sub(max_window);
    items.truncate(max_window);
    let absorbed = items.len();
    let total = page.total.unwrap_or(absorbed as u64);

    let window = Window {
        items,
        // Starting from the sentinel means this page is the real top. A
        // resumed cursor may have records above it.
        has_more_top: !cursor.is_sentinel(),
        has_more_bottom: page.has_next || trimmed > 0,
        total,
        top_exhausted: false,
        bottom_exhausted: false,
    };

    Merged {
        window,
        absorbed,
        trimmed,
    }
}

fn merge_top<R: Record>(
    current: Window<R>,
    page: Page<R>,
    order: SortOrder,
    max_window: usize,
) -> Merged<R> {
    let fresh = fresh_beyond(&current, normalize(page.records, order), Edge::Top, order);
    if fresh.is_empty() {
        let mut window = current;
        window.has_more_top = false;
        window.top_exhausted = true;
        return Merged::unchanged(window);
    }

    let absorbed = fresh.len();
    let mut items = fresh;
    items.extend(current.items);
    let trimmed = items.len().saturating_sub(max_window);
    items.truncate(max_window);

    // The bottom only stays closed if it was proven exhausted and is still
    // the same record.
    let bottom_exhausted = current.bottom_exhausted && trimmed == 0;

    let window = Window {
        items,
        has_more_top: page.has_next,
        has_more_bottom: !bottom_exhausted,
        total: page.total.unwrap_or(current.total),
        top_exhausted: false,
        bottom_exhausted,
    };

    Merged {
        window,
        absorbed,
        trimmed,
    }
}

fn merge_bottom<R: Record>(
    current: Window<R>,
    page: Page<R>,
    order: SortOrder,
    max_window: usize,
) -> Merged<R> {
    let fresh = fresh_beyond(&current, normalize(page.records, order), Edge::Bottom, order);
    if fresh.is_empty() {
        let mut window = current;
        window.has_more_bottom = false;
        window.bottom_exhausted = true;
        return Merged::unchanged(window);
    }

    let absorbed = fresh.len();
    let mut items = current.items;
    items.extend(fresh);
    let trimmed = items.len().saturating_sub(max_window);
    items.drain(..trimmed);

    let top_exhausted = current.top_exhausted && trimmed == 0;

    let window = Window {
        items,
        has_more_top: !top_exhausted,
        has_more_bottom: page.has_next,
        total: page.total.unwrap_or(current.total),
        top_exhausted,
        bottom_exhausted: false,
    };

    Merged {
        window,
        absorbed,
        trimmed,
    }
}

/// Sort records for `order` and drop repeated ids within the page.
fn normalize<R: Record>(mut records: Vec<R>, order: SortOrder) -> Vec<R> {
    records.sort_by(|a, b| compare(order, a.record_id(), b.record_id()));
    records.dedup_by_key(|r| r.record_id());
    records
}

fn compare(order: SortOrder, a: RecordId, b: RecordId) -> Ordering {
    match order {
        SortOrder::Asc => a.cmp(&b),
        SortOrder::Desc => b.cmp(&a),
    }
}

/// Records not yet in the window that lie strictly past `edge`.
///
/// A record that is new but falls inside the window's span (inserted
/// concurrently) cannot be placed without breaking the order, so it is left
/// for the next reset.
fn fresh_beyond<R: Record>(
    current: &Window<R>,
    records: Vec<R>,
    edge: Edge,
    order: SortOrder,
) -> Vec<R> {
    let seen = current.id_set();
    let bound = match edge {
        Edge::Top => current.first_id(),
        Edge::Bottom => current.last_id(),
    };

    records
        .into_iter()
        .filter(|r| !seen.contains(&r.record_id()))
        .filter(|r| match (edge, bound) {
            (_, None) => true,
            (Edge::Top, Some(first)) => order.precedes(r.record_id(), first),
            (Edge::Bottom, Some(last)) => order.precedes(last, r.record_id()),
        })
        .collect()
}
