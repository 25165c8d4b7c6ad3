//! `listwin browse`: load a list window and optionally extend it.

use std::path::PathBuf;
use std::sync::Arc;

use owo_colors::OwoColorize;

use super::{cursor_cache, load_fixture, print_json, render_status, render_window, snapshot_json};
use crate::api::{HttpListApi, ListApi, ListEndpoint};
use crate::config::Config;
use crate::engine::{FetchOutcome, ListEngine, Snapshot};
use crate::error::{ListwinError, Result};
use crate::notify::{CollectingNotifier, Toast};
use crate::types::{Edge, JsonRecord, SortOrder};

#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    pub resource: String,
    /// Explicit ascending sort. Without it the cached order (or desc) is used.
    pub asc: bool,
    /// Number of pages to load below the initial window.
    pub down: usize,
    /// Number of pages to load above the initial window.
    pub up: usize,
    /// Ignore the cached position and start from the top.
    pub refresh: bool,
    pub json: bool,
    pub fixture: Option<PathBuf>,
}

pub async fn cmd_browse(opts: BrowseOptions) -> Result<()> {
    let config = Config::load()?;
    let endpoint = ListEndpoint::new(&opts.resource);
    let cache = cursor_cache(&config, &endpoint);
    let notifier = Arc::new(CollectingNotifier::new());
    let options = config.engine_options();

    let snapshot = match &opts.fixture {
        Some(path) => {
            let api = Arc::new(load_fixture(path)?);
            let engine = ListEngine::with_options(api, endpoint, options)
                .with_cache(cache)
                .with_notifier(notifier.clone());
            browse(&engine, &opts).await?
        }
        None => {
            let api = Arc::new(HttpListApi::<JsonRecord>::from_config(&config)?);
            let engine = ListEngine::with_options(api, endpoint, options)
                .with_cache(cache)
                .with_notifier(notifier.clone());
            browse(&engine, &opts).await?
        }
    };

    print_toasts(&notifier.take());

    if opts.json {
        return print_json(&snapshot_json(&snapshot));
    }

    println!("{}", opts.resource.cyan().bold());
    println!("{}", render_window(&snapshot));
    println!("{}", render_status(&snapshot).dimmed());
    Ok(())
}

async fn browse<A>(engine: &ListEngine<A>, opts: &BrowseOptions) -> Result<Snapshot<JsonRecord>>
where
    A: ListApi<Record = JsonRecord>,
{
    let initial = if opts.asc || opts.refresh {
        let order = if opts.asc { SortOrder::Asc } else { SortOrder::Desc };
        engine.reset(order).await
    } else {
        engine.mount(SortOrder::Desc).await
    };
    if let FetchOutcome::Failed(message) = initial {
        return Err(ListwinError::Api(message));
    }

    extend(engine, Edge::Top, opts.up).await;
    extend(engine, Edge::Bottom, opts.down).await;

    Ok(engine.snapshot())
}

/// Load up to `pages` pages at `edge`, stopping once it is exhausted.
async fn extend<A: ListApi>(engine: &ListEngine<A>, edge: Edge, pages: usize) {
    for _ in 0..pages {
        let open = match edge {
            Edge::Top => engine.has_more_top(),
            Edge::Bottom => engine.has_more_bottom(),
        };
        if !open {
            break;
        }
        tokio::time::sleep(engine.options().throttle).await;
        if let FetchOutcome::Failed(_) = engine.load_edge(edge).await {
            break;
        }
    }
}

pub(super) fn print_toasts(toasts: &[Toast]) {
    for toast in toasts {
        eprintln!("{}", toast.message.yellow());
    }
}
