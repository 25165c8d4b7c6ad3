//! Keyset cursor describing where the next page starts.

use std::fmt;

use crate::error::{ListwinError, Result};
use crate::types::{Edge, Record, RecordId, SortOrder};

use super::Window;

/// Where a fetch starts and which way it walks.
///
/// `begin_id == 0` means "start of the collection in the current direction".
/// `forward` walks toward later records in the active sort; `asc` is the
/// collection's global sort order and is independent of `forward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub begin_id: RecordId,
    pub forward: bool,
    pub asc: bool,
}

impl Cursor {
    pub const SENTINEL: RecordId = 0;

    /// Cursor for the first page of a collection.
    pub fn start(order: SortOrder) -> Self {
        Self {
            begin_id: Self::SENTINEL,
            forward: true,
            asc: order.is_asc(),
        }
    }

    /// Forward cursor starting after `begin_id` (a cached resume point).
    pub fn resume(begin_id: RecordId, order: SortOrder) -> Self {
        Self {
            begin_id: begin_id.max(Self::SENTINEL),
            forward: true,
            asc: order.is_asc(),
        }
    }

    /// Cursor that extends `window` past the given edge.
    ///
    /// An empty window has no edge record to key off, so it falls back to
    /// the start of the collection.
    pub fn for_edge<R: Record>(window: &Window<R>, edge: Edge, order: SortOrder) -> Self {
        let anchor = match edge {
            Edge::Top => window.first_id(),
            Edge::Bottom => window.last_id(),
        };

        match anchor {
            Some(begin_id) => Self {
                begin_id,
                forward: edge == Edge::Bottom,
                asc: order.is_asc(),
            },
            None => Self::start(order),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.begin_id == Self::SENTINEL
    }

    pub fn order(&self) -> SortOrder {
        if self.asc {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    /// The `beginID` query value, omitted for the sentinel.
    pub fn begin_param(&self) -> Option<String> {
        if self.is_sentinel() {
            None
        } else {
            Some(self.begin_id.to_string())
        }
    }

    /// Parse a `beginID` as it travels on the wire and through the cache.
    pub fn parse_begin_id(raw: &str) -> Result<RecordId> {
        let trimmed = raw.trim();
        match trimmed.parse::<RecordId>() {
            Ok(id) if id >= Self::SENTINEL => Ok(id),
            _ => Err(ListwinError::InvalidCursor(raw.to_string())),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "beginID={} forward={} asc={}",
            self.begin_id, self.forward, self.asc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonRecord;

    fn window_of(ids: &[RecordId]) -> Window<JsonRecord> {
        Window::with_items(
            ids.iter().map(|id| JsonRecord::new(*id)).collect(),
            true,
            true,
            100,
        )
    }

    #[test]
    fn test_start_cursor_is_sentinel_forward() {
        let c = Cursor::start(SortOrder::Desc);
        assert!(c.is_sentinel());
        assert!(c.forward);
        assert!(!c.asc);
        assert_eq!(c.begin_param(), None);
    }

    #[test]
    fn test_edge_cursor_uses_window_bounds() {
        let w = window_of(&[50, 49, 48]);

        let up = Cursor::for_edge(&w, Edge::Top, SortOrder::Desc);
        assert_eq!(up.begin_id, 50);
        assert!(!up.forward);

        let down = Cursor::for_edge(&w, Edge::Bottom, SortOrder::Desc);
        assert_eq!(down.begin_id, 48);
        assert!(down.forward);
        assert_eq!(down.begin_param().as_deref(), Some("48"));
    }

    #[test]
    fn test_edge_cursor_on_empty_window_starts_over() {
        let w: Window<JsonRecord> = Window::new();
        let up = Cursor::for_edge(&w, Edge::Top, SortOrder::Asc);
        assert_eq!(up, Cursor::start(SortOrder::Asc));
    }

    #[test]
    fn test_parse_begin_id() {
        assert_eq!(Cursor::parse_begin_id("0").unwrap(), 0);
        assert_eq!(Cursor::parse_begin_id(" 42 ").unwrap(), 42);
        assert!(Cursor::parse_begin_id("-3").is_err());
        assert!(Cursor::parse_begin_id("abc").is_err());
        assert!(Cursor::parse_begin_id("").is_err());
    }

    #[test]
    fn test_resume_clamps_negative() {
        let c = Cursor::resume(-5, SortOrder::Asc);
        assert!(c.is_sentinel());
        assert!(c.asc);
    }
}
