mod browse;
mod cache;
mod config;
mod search;

pub use browse::{BrowseOptions, cmd_browse};
pub use cache::{cmd_cache_clear, cmd_cache_path, cmd_cache_show};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use search::{SearchOptions, cmd_search};

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;

use crate::api::{ListEndpoint, MemoryListApi};
use crate::cache::{CursorCache, FileStore};
use crate::config::Config;
use crate::engine::Snapshot;
use crate::error::{ListwinError, Result};
use crate::types::JsonRecord;

/// Print a JSON value to stdout, pretty-printed
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Records served by `--fixture` instead of the HTTP API.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Records(Vec<JsonRecord>),
    Full {
        records: Vec<JsonRecord>,
        #[serde(default)]
        search: HashMap<String, Vec<JsonRecord>>,
    },
}

/// Load a fixture file into an in-process backend.
pub fn load_fixture(path: &Path) -> Result<MemoryListApi<JsonRecord>> {
    let content = fs::read_to_string(path).map_err(|e| {
        ListwinError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read fixture {}: {}", path.display(), e),
        ))
    })?;
    let fixture: FixtureFile = serde_json::from_str(&content).map_err(|e| {
        ListwinError::Other(format!("invalid fixture {}: {e}", path.display()))
    })?;

    let api = match fixture {
        FixtureFile::Records(records) => MemoryListApi::new(records),
        FixtureFile::Full { records, search } => {
            let api = MemoryListApi::new(records);
            for (keyword, results) in search {
                api.set_search_results(&keyword, results);
            }
            api
        }
    };
    Ok(api)
}

/// Cursor cache for `endpoint` in the configured cache directory.
pub fn cursor_cache(config: &Config, endpoint: &ListEndpoint) -> CursorCache {
    let store = Arc::new(FileStore::new(config.cache_dir()));
    CursorCache::new(store, endpoint.cache_key.clone()).with_expiry(config.cache_expiry())
}

/// One rendered line of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct WindowRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Label")]
    pub label: String,
}

pub fn window_rows(items: &[JsonRecord]) -> Vec<WindowRow> {
    items
        .iter()
        .map(|record| WindowRow {
            id: record.id,
            label: record.label().unwrap_or("-").to_string(),
        })
        .collect()
}

/// Plain-text table of the window contents.
pub fn render_window(snapshot: &Snapshot<JsonRecord>) -> String {
    use tabled::Table;
    use tabled::settings::Style;

    if snapshot.items.is_empty() {
        return "No records.".to_string();
    }
    let mut table = Table::new(window_rows(&snapshot.items));
    table.with(Style::modern());
    table.to_string()
}

/// One-line summary of the window edges.
pub fn render_status(snapshot: &Snapshot<JsonRecord>) -> String {
    let mark = |open: bool| if open { "more" } else { "end" };
    format!(
        "{} of {} ({}) | top: {} | bottom: {}",
        snapshot.items.len(),
        snapshot.total,
        snapshot.sort_order,
        mark(snapshot.has_more_top),
        mark(snapshot.has_more_bottom),
    )
}

pub fn snapshot_json(snapshot: &Snapshot<JsonRecord>) -> serde_json::Value {
    json!({
        "items": snapshot.items,
        "has_more_top": snapshot.has_more_top,
        "has_more_bottom": snapshot.has_more_bottom,
        "total": snapshot.total,
        "sort_order": snapshot.sort_order.to_string(),
        "search_keyword": snapshot.search_keyword,
    })
}
