use jiff::Timestamp;
use owo_colors::OwoColorize;
use serde_json::json;

use super::print_json;
use crate::cache::{CacheEntry, CacheStore, FileStore};
use crate::config::Config;
use crate::error::Result;

fn store(config: &Config) -> FileStore {
    FileStore::new(config.cache_dir())
}

/// List every cached cursor.
pub fn cmd_cache_show(output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let store = store(&config);
    let now = Timestamp::now();
    let expiry = config.cache_expiry();

    let mut entries = Vec::new();
    for key in store.keys()? {
        let Some(raw) = store.get(&key)? else {
            continue;
        };
        let entry = serde_json::from_str::<CacheEntry>(&raw).ok();
        entries.push((key, entry));
    }

    if output_json {
        let items: Vec<_> = entries
            .iter()
            .map(|(key, entry)| match entry {
                Some(entry) => json!({
                    "key": key,
                    "begin_id": entry.begin_id,
                    "sort_order": entry.sort_order.to_string(),
                    "age_secs": entry.age(now).as_secs(),
                    "expired": entry.age(now) > expiry,
                }),
                None => json!({ "key": key, "corrupt": true }),
            })
            .collect();
        return print_json(&json!({
            "cache_dir": store.dir().to_string_lossy(),
            "entries": items,
        }));
    }

    if entries.is_empty() {
        println!("No cached list positions in {}", store.dir().display());
        return Ok(());
    }

    for (key, entry) in &entries {
        match entry {
            Some(entry) => {
                let age = entry.age(now);
                let state = if age > expiry {
                    "expired".dimmed().to_string()
                } else {
                    "fresh".green().to_string()
                };
                println!(
                    "{}  beginID={} order={} age={}s {}",
                    key.cyan(),
                    entry.begin_id,
                    entry.sort_order,
                    age.as_secs(),
                    state
                );
            }
            None => println!("{}  {}", key.cyan(), "corrupt".red()),
        }
    }
    Ok(())
}

/// Remove one cached cursor, or all of them.
pub fn cmd_cache_clear(key: Option<&str>, output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let store = store(&config);

    let removed: Vec<String> = match key {
        Some(key) => {
            let existed = store.get(key)?.is_some();
            store.remove(key)?;
            if existed { vec![key.to_string()] } else { Vec::new() }
        }
        None => {
            let keys = store.keys()?;
            for key in &keys {
                store.remove(key)?;
            }
            keys
        }
    };

    if output_json {
        return print_json(&json!({
            "action": "cache_clear",
            "success": true,
            "removed": removed,
        }));
    }

    if removed.is_empty() {
        println!("Nothing to clear.");
    } else {
        println!("Cleared {} cached list position(s).", removed.len());
    }
    Ok(())
}

pub fn cmd_cache_path(output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let dir = config.cache_dir();
    if output_json {
        print_json(&json!({ "cache_dir": dir.to_string_lossy() }))
    } else {
        println!("{}", dir.display());
        Ok(())
    }
}
