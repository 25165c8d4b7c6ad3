use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ListwinError;

pub const LISTWIN_DIR: &str = ".listwin";

/// Default upper bound on the number of records held in a window.
pub const DEFAULT_MAX_WINDOW: usize = 50;
/// Default `pageSize` sent to the List API.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Bottom-edge proximity, in pixels, that fires a downward fetch.
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 10.0;
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(300);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_RECHECK_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_CACHE_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Returns the listwin working directory (`LISTWIN_ROOT` or `.listwin`).
pub fn listwin_root() -> PathBuf {
    match std::env::var("LISTWIN_ROOT") {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(LISTWIN_DIR),
    }
}

/// Record identifier. Strictly positive for real records; `0` is the cursor sentinel.
pub type RecordId = i64;

/// An opaque list entry. Only the identifier is interpreted.
pub trait Record: Clone + Send + Sync + 'static {
    fn record_id(&self) -> RecordId;
}

/// Record type used when the entity's fields are unknown: the id plus
/// every other field kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl JsonRecord {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Best-effort human label: the first string-valued field among the usual
    /// naming keys.
    pub fn label(&self) -> Option<&str> {
        ["name", "title", "nickname", "username", "filename"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(|v| v.as_str()))
    }
}

impl Record for JsonRecord {
    fn record_id(&self) -> RecordId {
        self.id
    }
}

/// Global sort order of the collection, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn is_asc(self) -> bool {
        self == SortOrder::Asc
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// True when `a` belongs strictly above `b` in this order.
    pub fn precedes(self, a: RecordId, b: RecordId) -> bool {
        match self {
            SortOrder::Asc => a < b,
            SortOrder::Desc => a > b,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ListwinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ListwinError::Config(format!(
                "unknown sort order '{s}', expected 'asc' or 'desc'"
            ))),
        }
    }
}

/// One end of the window. `Top` is earlier in the active sort, `Bottom` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => write!(f, "up"),
            Edge::Bottom => write!(f, "down"),
        }
    }
}

/// How a fetched page is combined with the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Reset,
    Extend(Edge),
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Reset => write!(f, "reset"),
            FetchMode::Extend(edge) => write!(f, "{edge}"),
        }
    }
}
