//! Turning viewport geometry into edge fetches.
//!
//! The rules themselves are pure ([`ScrollTrigger::evaluate`]). [`ScrollDriver`]
//! feeds them from a channel of viewport events and re-checks the top rule a
//! short while after every window change: content prepended while the view
//! sits at `scrollTop == 0` produces no further scroll event on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};

use crate::api::ListApi;
use crate::types::{DEFAULT_SCROLL_THRESHOLD_PX, Edge};

use super::{ListEngine, Snapshot};

/// Scroll container geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    pub fn at_top(&self) -> bool {
        self.scroll_top <= 0.0
    }

    pub fn distance_to_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }
}

/// The engine state the trigger rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeState {
    pub has_more_top: bool,
    pub has_more_bottom: bool,
    pub loading_top: bool,
    pub loading_bottom: bool,
    pub searching: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    pub threshold_px: f64,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
        }
    }
}

impl ScrollTrigger {
    pub fn new(threshold_px: f64) -> Self {
        Self { threshold_px }
    }

    pub fn wants_top(&self, viewport: &Viewport, state: &EdgeState) -> bool {
        !state.searching && viewport.at_top() && state.has_more_top && !state.loading_top
    }

    pub fn wants_bottom(&self, viewport: &Viewport, state: &EdgeState) -> bool {
        !state.searching
            && viewport.distance_to_bottom() < self.threshold_px
            && state.has_more_bottom
            && !state.loading_bottom
    }

    /// Edges to fetch for this viewport, top first.
    pub fn evaluate(&self, viewport: &Viewport, state: &EdgeState) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(2);
        if self.wants_top(viewport, state) {
            edges.push(Edge::Top);
        }
        if self.wants_bottom(viewport, state) {
            edges.push(Edge::Bottom);
        }
        edges
    }
}

/// Host side of a [`ScrollDriver`].
#[derive(Debug, Clone)]
pub struct ScrollHandle {
    tx: mpsc::Sender<Viewport>,
}

impl ScrollHandle {
    /// Report a scroll event. Returns false when the driver is gone or
    /// backlogged, in which case the event is dropped.
    pub fn scrolled(&self, viewport: Viewport) -> bool {
        self.tx.try_send(viewport).is_ok()
    }

    pub async fn send(&self, viewport: Viewport) -> bool {
        self.tx.send(viewport).await.is_ok()
    }
}

/// Runs the scroll rules against an engine until every [`ScrollHandle`] is
/// dropped.
pub struct ScrollDriver<A: ListApi + 'static> {
    engine: Arc<ListEngine<A>>,
    events: mpsc::Receiver<Viewport>,
    changes: watch::Receiver<Snapshot<A::Record>>,
    recheck_delay: Duration,
}

impl<A: ListApi + 'static> ScrollDriver<A> {
    pub fn new(engine: Arc<ListEngine<A>>) -> (ScrollHandle, Self) {
        let (tx, events) = mpsc::channel(32);
        let changes = engine.subscribe();
        let recheck_delay = engine.options().recheck_delay;
        let driver = Self {
            engine,
            events,
            changes,
            recheck_delay,
        };
        (ScrollHandle { tx }, driver)
    }

    pub async fn run(mut self) {
        let mut recheck_at: Option<Instant> = None;

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(viewport) = event else { break };
                    for edge in self.engine.scroll_targets(viewport) {
                        self.spawn_load(edge);
                    }
                }
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    recheck_at = Some(Instant::now() + self.recheck_delay);
                }
                _ = sleep_until(recheck_at.unwrap_or_else(Instant::now)), if recheck_at.is_some() => {
                    recheck_at = None;
                    if let Some(edge) = self.engine.recheck_top() {
                        tracing::debug!("top re-check after window change");
                        self.spawn_load(edge);
                    }
                }
            }
        }
        tracing::debug!("scroll driver stopped");
    }

    fn spawn_load(&self, edge: Edge) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            engine.load_edge(edge).await;
        });
    }
}
