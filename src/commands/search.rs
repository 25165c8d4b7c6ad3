//! `listwin search`: run a keyword search against a list.

use std::path::PathBuf;
use std::sync::Arc;

use owo_colors::OwoColorize;

use super::browse::print_toasts;
use super::{load_fixture, print_json, render_status, render_window, snapshot_json};
use crate::api::{HttpListApi, ListApi, ListEndpoint};
use crate::config::Config;
use crate::engine::{ListEngine, SearchOutcome, Snapshot};
use crate::error::{ListwinError, Result};
use crate::notify::CollectingNotifier;
use crate::types::JsonRecord;

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub resource: String,
    pub keyword: String,
    /// Key of the result array inside `data`, for `{ data: { <key>: [...] } }`.
    pub search_key: Option<String>,
    pub json: bool,
    pub fixture: Option<PathBuf>,
}

pub async fn cmd_search(opts: SearchOptions) -> Result<()> {
    if opts.keyword.trim().is_empty() {
        return Err(ListwinError::Other("search keyword cannot be empty".to_string()));
    }

    let config = Config::load()?;
    let mut endpoint = ListEndpoint::new(&opts.resource);
    if let Some(key) = &opts.search_key {
        endpoint = endpoint.with_search_key(key);
    }
    let notifier = Arc::new(CollectingNotifier::new());
    let options = config.engine_options();

    let snapshot = match &opts.fixture {
        Some(path) => {
            let api = Arc::new(load_fixture(path)?);
            let engine =
                ListEngine::with_options(api, endpoint, options).with_notifier(notifier.clone());
            search(&engine, &opts.keyword).await
        }
        None => {
            let api = Arc::new(HttpListApi::<JsonRecord>::from_config(&config)?);
            let engine =
                ListEngine::with_options(api, endpoint, options).with_notifier(notifier.clone());
            search(&engine, &opts.keyword).await
        }
    };

    print_toasts(&notifier.take());
    let snapshot = snapshot?;

    if opts.json {
        return print_json(&snapshot_json(&snapshot));
    }

    println!(
        "{} {}",
        opts.resource.cyan().bold(),
        format!("\"{}\"", opts.keyword.trim()).dimmed()
    );
    println!("{}", render_window(&snapshot));
    println!("{}", render_status(&snapshot).dimmed());
    Ok(())
}

async fn search<A>(engine: &ListEngine<A>, keyword: &str) -> Result<Snapshot<JsonRecord>>
where
    A: ListApi<Record = JsonRecord>,
{
    match engine.set_search_keyword(keyword).await {
        SearchOutcome::Applied { .. } => Ok(engine.snapshot()),
        SearchOutcome::Failed(message) => Err(ListwinError::Api(message)),
        other => Err(ListwinError::Other(format!("search did not complete: {other:?}"))),
    }
}
