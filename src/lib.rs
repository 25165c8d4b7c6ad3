pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod types;
pub mod window;

pub use api::{HttpListApi, ListApi, ListEndpoint, MemoryListApi, Page, PageQuery};
pub use cache::{CacheStore, CursorCache, FileStore, MemoryStore};
pub use config::Config;
pub use engine::{
    EngineOptions, FetchOutcome, ListEngine, Phase, ScrollDriver, ScrollHandle, SearchOutcome,
    Snapshot, Viewport,
};
pub use error::{ListwinError, Result};
pub use notify::{Notifier, Toast};
pub use types::{Edge, FetchMode, JsonRecord, Record, RecordId, SortOrder};
pub use window::{Cursor, Window};
