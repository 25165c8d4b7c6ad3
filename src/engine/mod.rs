//! The list engine: one browsable list bound to a List API endpoint.
//!
//! All commands take `&self`, so an engine is normally shared as an `Arc`.
//! State sits behind a mutex that is never held across an await. Every
//! change is published as a [`Snapshot`] on a watch channel.
//!
//! Fetch failures and stale responses never surface as errors. Failures become
//! a [`Toast`] for the host's [`Notifier`] and leave the window as it was.

pub mod executor;
pub mod scroll;
pub mod search;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::api::{ListApi, ListEndpoint, PageQuery};
use crate::cache::CursorCache;
use crate::notify::{LogNotifier, Notifier, Toast};
use crate::types::{
    DEFAULT_DEBOUNCE, DEFAULT_MAX_WINDOW, DEFAULT_PAGE_SIZE, DEFAULT_RECHECK_DELAY,
    DEFAULT_SCROLL_THRESHOLD_PX, DEFAULT_THROTTLE, Edge, FetchMode, Record, RecordId, SortOrder,
};
use crate::window::{Cursor, MergeContext, Window, merge, replace_with_search};

pub use executor::{FetchGuard, FetchTicket, SkipReason};
pub use scroll::{EdgeState, ScrollDriver, ScrollHandle, ScrollTrigger, Viewport};
pub use search::SearchState;

/// Tuning knobs. See [`crate::config::Config::engine_options`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub page_size: usize,
    pub max_window: usize,
    pub throttle: Duration,
    pub debounce: Duration,
    pub recheck_delay: Duration,
    pub scroll_threshold_px: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_window: DEFAULT_MAX_WINDOW,
            throttle: DEFAULT_THROTTLE,
            debounce: DEFAULT_DEBOUNCE,
            recheck_delay: DEFAULT_RECHECK_DELAY,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
        }
    }
}

/// What the engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Initial,
    LoadingTop,
    LoadingBottom,
    Searching,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Initial => write!(f, "initial"),
            Phase::LoadingTop => write!(f, "loading-top"),
            Phase::LoadingBottom => write!(f, "loading-bottom"),
            Phase::Searching => write!(f, "searching"),
        }
    }
}

/// Everything a host renders from.
#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    pub items: Vec<R>,
    pub has_more_top: bool,
    pub has_more_bottom: bool,
    pub total: u64,
    pub phase: Phase,
    pub sort_order: SortOrder,
    pub search_keyword: Option<String>,
    /// Increases with every published change.
    pub revision: u64,
}

/// Result of a page fetch command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged into the window.
    Applied { absorbed: usize, trimmed: usize },
    /// No request was made.
    Skipped(SkipReason),
    /// The response arrived after a newer reset and was dropped.
    Stale,
    /// The request failed; the window is unchanged.
    Failed(String),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}

/// Result of [`ListEngine::set_search_keyword`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results replaced the window.
    Applied { count: usize },
    /// A newer keyword arrived during the debounce or the request.
    Superseded,
    /// The keyword was cleared and the list reloaded.
    Cleared(FetchOutcome),
    /// The keyword was already empty.
    Unchanged,
    /// The search failed; the window was emptied.
    Failed(String),
}

struct EngineState<R> {
    window: Window<R>,
    order: SortOrder,
    /// Order requested by the reset in flight. It becomes `order` once that
    /// reset's page is applied.
    pending_order: Option<SortOrder>,
    guard: FetchGuard,
    search: SearchState,
    mounted: bool,
    viewport: Option<Viewport>,
    revision: u64,
}

impl<R: Record> EngineState<R> {
    fn phase(&self) -> Phase {
        if self.search.is_active() {
            return Phase::Searching;
        }
        match self.guard.loading() {
            Some(FetchMode::Reset) => Phase::Initial,
            Some(FetchMode::Extend(Edge::Top)) => Phase::LoadingTop,
            Some(FetchMode::Extend(Edge::Bottom)) => Phase::LoadingBottom,
            None => Phase::Idle,
        }
    }

    fn edge_state(&self) -> EdgeState {
        let loading = self.guard.loading();
        EdgeState {
            has_more_top: self.window.has_more_top(),
            has_more_bottom: self.window.has_more_bottom(),
            loading_top: loading == Some(FetchMode::Extend(Edge::Top)),
            loading_bottom: loading == Some(FetchMode::Extend(Edge::Bottom)),
            searching: self.search.is_active(),
        }
    }

    fn snapshot(&self) -> Snapshot<R> {
        Snapshot {
            items: self.window.items().to_vec(),
            has_more_top: self.window.has_more_top(),
            has_more_bottom: self.window.has_more_bottom(),
            total: self.window.total(),
            phase: self.phase(),
            sort_order: self.order,
            search_keyword: self.search.keyword().map(str::to_string),
            revision: self.revision,
        }
    }
}

/// Clears an in-flight slot if the fetch future is dropped before completing.
struct InFlightRelease<'a, R> {
    state: &'a Mutex<EngineState<R>>,
    ticket: FetchTicket,
}

impl<R> Drop for InFlightRelease<'_, R> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.guard.finish(&self.ticket) {
            state.pending_order = None;
        }
    }
}

pub struct ListEngine<A: ListApi> {
    api: Arc<A>,
    endpoint: ListEndpoint,
    options: EngineOptions,
    trigger: ScrollTrigger,
    cache: Option<CursorCache>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<EngineState<A::Record>>,
    changes: watch::Sender<Snapshot<A::Record>>,
}

impl<A: ListApi> ListEngine<A> {
    pub fn new(api: Arc<A>, endpoint: ListEndpoint) -> Self {
        Self::with_options(api, endpoint, EngineOptions::default())
    }

    pub fn with_options(api: Arc<A>, endpoint: ListEndpoint, options: EngineOptions) -> Self {
        let state = EngineState {
            window: Window::new(),
            order: SortOrder::default(),
            pending_order: None,
            guard: FetchGuard::new(options.throttle),
            search: SearchState::new(),
            mounted: false,
            viewport: None,
            revision: 0,
        };
        let (changes, _) = watch::channel(state.snapshot());

        Self {
            api,
            endpoint,
            trigger: ScrollTrigger::new(options.scroll_threshold_px),
            options,
            cache: None,
            notifier: Arc::new(LogNotifier),
            state: Mutex::new(state),
            changes,
        }
    }

    /// Persist the list position in `cache`.
    pub fn with_cache(mut self, cache: CursorCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn endpoint(&self) -> &ListEndpoint {
        &self.endpoint
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    // Read signals

    pub fn items(&self) -> Vec<A::Record> {
        self.state.lock().window.items().to_vec()
    }

    pub fn has_more_top(&self) -> bool {
        self.state.lock().window.has_more_top()
    }

    pub fn has_more_bottom(&self) -> bool {
        self.state.lock().window.has_more_bottom()
    }

    pub fn total(&self) -> u64 {
        self.state.lock().window.total()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.state.lock().order
    }

    pub fn search_keyword(&self) -> Option<String> {
        self.state.lock().search.keyword().map(str::to_string)
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.state.lock().window.ids()
    }

    pub fn snapshot(&self) -> Snapshot<A::Record> {
        self.state.lock().snapshot()
    }

    /// Receive a [`Snapshot`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<A::Record>> {
        self.changes.subscribe()
    }

    // Commands

    /// First load. Resumes from the cursor cache when a fresh entry exists,
    /// whose sort order then wins over `default_order`. The cache is consulted
    /// only on the first mount; later calls behave like [`Self::reset`].
    pub async fn mount(&self, default_order: SortOrder) -> FetchOutcome {
        let first = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.mounted, true)
        };
        if !first {
            return self.reset(default_order).await;
        }

        let resume = self.cache.as_ref().and_then(CursorCache::load);
        match resume.and_then(|entry| entry.cursor()) {
            Some(cursor) => {
                tracing::info!(
                    resource = %self.endpoint.resource,
                    begin_id = cursor.begin_id,
                    order = %cursor.order(),
                    "resuming list from cached cursor"
                );
                let outcome = self.run_reset(cursor.order(), cursor).await;
                if cursor.is_sentinel()
                    || outcome != (FetchOutcome::Applied { absorbed: 0, trimmed: 0 })
                {
                    return outcome;
                }
                // Everything from the cached position on was deleted.
                tracing::info!(
                    resource = %self.endpoint.resource,
                    "cached cursor is past the end of the list, starting from the top"
                );
                self.run_reset(cursor.order(), Cursor::start(cursor.order())).await
            }
            None => self.run_reset(default_order, Cursor::start(default_order)).await,
        }
    }

    /// Reload from the top of the collection in `order`.
    ///
    /// While search results are shown only the order is recorded. The reload
    /// happens when the search is cleared.
    pub async fn reset(&self, order: SortOrder) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            state.mounted = true;
            if state.search.is_active() {
                state.order = order;
                self.publish(&mut state);
                return FetchOutcome::Skipped(SkipReason::SearchActive);
            }
        }
        self.run_reset(order, Cursor::start(order)).await
    }

    /// Reset in the current order, or in the order of a reset still in flight.
    pub async fn refresh(&self) -> FetchOutcome {
        let order = {
            let state = self.state.lock();
            state.pending_order.unwrap_or(state.order)
        };
        self.reset(order).await
    }

    /// Extend the window at `edge`.
    pub async fn load_edge(&self, edge: Edge) -> FetchOutcome {
        self.run_fetch(FetchMode::Extend(edge), None).await
    }

    /// Change the search keyword. A non-empty keyword switches to search mode
    /// at once and queries after the debounce interval; an empty one leaves
    /// search mode with a full reset.
    pub async fn set_search_keyword(&self, keyword: &str) -> SearchOutcome {
        let (seq, was_active, order) = {
            let mut state = self.state.lock();
            let (seq, was_active) = state.search.update(keyword);
            if state.search.is_active() {
                // Any window fetch in flight belongs to the list being replaced.
                state.guard.supersede();
                state.pending_order = None;
                state.window.close_edges();
            } else if was_active {
                // Search results are in server order, not the list's. Edges
                // stay closed until the reset lands.
                state.window = Window::new();
            }
            self.publish(&mut state);
            (seq, was_active, state.order)
        };

        if keyword.trim().is_empty() {
            if !was_active {
                return SearchOutcome::Unchanged;
            }
            tracing::info!(resource = %self.endpoint.resource, "search cleared");
            return SearchOutcome::Cleared(self.run_reset(order, Cursor::start(order)).await);
        }

        tokio::time::sleep(self.options.debounce).await;
        if !self.state.lock().search.is_current(seq) {
            return SearchOutcome::Superseded;
        }

        let keyword = keyword.trim();
        tracing::info!(resource = %self.endpoint.resource, keyword, "searching");
        let result = self.api.search(&self.endpoint, keyword).await;

        let outcome = {
            let mut state = self.state.lock();
            if !state.search.is_current(seq) {
                tracing::debug!(keyword, "dropping superseded search response");
                return SearchOutcome::Superseded;
            }
            let outcome = match result {
                Ok(records) => {
                    state.window = replace_with_search(records);
                    SearchOutcome::Applied {
                        count: state.window.len(),
                    }
                }
                Err(e) => {
                    state.window = Window::new();
                    SearchOutcome::Failed(e.to_string())
                }
            };
            self.publish(&mut state);
            outcome
        };

        if let SearchOutcome::Failed(message) = &outcome {
            tracing::warn!(keyword, "search failed: {message}");
            self.notifier
                .notify(Toast::error(format!("Search failed: {message}")));
        }
        outcome
    }

    /// Drop a record deleted elsewhere without refetching.
    pub fn remove_local(&self, id: RecordId) -> bool {
        let mut state = self.state.lock();
        let removed = state.window.remove(id);
        if removed {
            self.publish(&mut state);
        }
        removed
    }

    /// Record the viewport and return the edges its position asks for.
    pub fn scroll_targets(&self, viewport: Viewport) -> Vec<Edge> {
        let mut state = self.state.lock();
        state.viewport = Some(viewport);
        self.trigger.evaluate(&viewport, &state.edge_state())
    }

    /// Scroll passthrough for hosts without a [`ScrollDriver`]: evaluate the
    /// rules and run the resulting fetches in turn.
    pub async fn on_scroll(&self, viewport: Viewport) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::new();
        for edge in self.scroll_targets(viewport) {
            outcomes.push(self.load_edge(edge).await);
        }
        outcomes
    }

    /// The top rule against the last reported viewport.
    pub fn recheck_top(&self) -> Option<Edge> {
        let state = self.state.lock();
        let viewport = state.viewport?;
        self.trigger
            .wants_top(&viewport, &state.edge_state())
            .then_some(Edge::Top)
    }

    async fn run_reset(&self, order: SortOrder, cursor: Cursor) -> FetchOutcome {
        tracing::info!(resource = %self.endpoint.resource, %order, %cursor, "resetting list");
        self.run_fetch(FetchMode::Reset, Some((order, cursor))).await
    }

    async fn run_fetch(&self, mode: FetchMode, reset: Option<(SortOrder, Cursor)>) -> FetchOutcome {
        let (ticket, query) = {
            let mut state = self.state.lock();
            if state.search.is_active() {
                return FetchOutcome::Skipped(SkipReason::SearchActive);
            }

            let cursor = match (mode, reset) {
                (FetchMode::Extend(edge), _) => Cursor::for_edge(&state.window, edge, state.order),
                (FetchMode::Reset, Some((_, cursor))) => cursor,
                (FetchMode::Reset, None) => Cursor::start(state.order),
            };

            let ticket = match state.guard.admit(mode, Instant::now()) {
                Ok(ticket) => ticket,
                Err(reason) => {
                    tracing::debug!(%mode, "fetch skipped: {reason}");
                    return FetchOutcome::Skipped(reason);
                }
            };

            // The current window and order stay in place until the page
            // arrives, so a failed reset leaves them untouched.
            if let Some((order, _)) = reset {
                state.pending_order = Some(order);
            }
            self.publish(&mut state);

            (ticket, PageQuery::new(self.options.page_size, cursor))
        };
        let _release = InFlightRelease {
            state: &self.state,
            ticket,
        };

        tracing::debug!(
            resource = %self.endpoint.resource,
            %mode,
            page_size = query.page_size,
            cursor = %query.cursor,
            "fetching page"
        );
        let result = self.api.fetch_page(&self.endpoint, &query).await;

        let (outcome, save) = {
            let mut state = self.state.lock();
            if !state.guard.finish(&ticket) {
                tracing::warn!(%mode, generation = ticket.generation, "dropping stale page");
                return FetchOutcome::Stale;
            }

            let pending_order = state.pending_order.take();
            match result {
                Err(e) => {
                    self.publish(&mut state);
                    (FetchOutcome::Failed(e.to_string()), None)
                }
                Ok(page) => {
                    if let Some(order) = pending_order {
                        state.order = order;
                    }
                    let ctx = MergeContext {
                        cursor: query.cursor,
                        max_window: self.options.max_window,
                    };
                    let current = std::mem::take(&mut state.window);
                    let merged = merge(current, page, mode, &ctx);
                    tracing::debug!(
                        %mode,
                        absorbed = merged.absorbed,
                        trimmed = merged.trimmed,
                        len = merged.window.len(),
                        has_more_top = merged.window.has_more_top(),
                        has_more_bottom = merged.window.has_more_bottom(),
                        "merged page"
                    );
                    state.window = merged.window;
                    self.publish(&mut state);

                    let save = match mode {
                        FetchMode::Reset => Some(state.window.first_id().unwrap_or(Cursor::SENTINEL)),
                        FetchMode::Extend(Edge::Top) if merged.absorbed > 0 => state.window.first_id(),
                        FetchMode::Extend(_) => None,
                    };
                    let outcome = FetchOutcome::Applied {
                        absorbed: merged.absorbed,
                        trimmed: merged.trimmed,
                    };
                    (outcome, save.map(|id| (id, state.order)))
                }
            }
        };

        if let FetchOutcome::Failed(message) = &outcome {
            tracing::warn!(resource = %self.endpoint.resource, %mode, "page fetch failed: {message}");
            self.notifier
                .notify(Toast::error(format!("Failed to load list: {message}")));
        }

        if let (Some((first_id, order)), Some(cache)) = (save, &self.cache)
            && let Err(e) = cache.save(first_id, order)
        {
            tracing::warn!(key = cache.key(), "failed to save list cursor: {e}");
        }

        outcome
    }

    fn publish(&self, state: &mut EngineState<A::Record>) {
        state.revision += 1;
        self.changes.send_replace(state.snapshot());
    }
}

impl<A: ListApi> fmt::Debug for ListEngine<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListEngine")
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
