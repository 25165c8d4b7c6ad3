//! Admission control for list fetches.
//!
//! One fetch may be in flight per engine. Edge fetches arriving while one is
//! running, or sooner than the throttle interval after the previous start,
//! are dropped rather than queued. Resets are always admitted: they start a
//! new generation, and anything still in flight from an older generation is
//! discarded when it lands.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::FetchMode;

/// Why a fetch was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is still running.
    InFlight,
    /// Too soon after the previous fetch started.
    Throttled,
    /// Search results are shown; pagination is suspended.
    SearchActive,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InFlight => write!(f, "a fetch is already in flight"),
            SkipReason::Throttled => write!(f, "throttled"),
            SkipReason::SearchActive => write!(f, "search is active"),
        }
    }
}

/// Proof of admission, handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub generation: u64,
    pub mode: FetchMode,
}

#[derive(Debug)]
pub struct FetchGuard {
    throttle: Duration,
    in_flight: Option<FetchTicket>,
    last_start: Option<Instant>,
    next_id: u64,
    generation: u64,
}

impl FetchGuard {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            in_flight: None,
            last_start: None,
            next_id: 1,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// What is currently loading, if anything.
    pub fn loading(&self) -> Option<FetchMode> {
        self.in_flight.map(|t| t.mode)
    }

    /// Invalidate everything in flight. Their responses will be stale.
    pub fn supersede(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = None;
        self.generation
    }

    /// Decide whether a fetch of `mode` may start at `now`.
    pub fn admit(&mut self, mode: FetchMode, now: Instant) -> Result<FetchTicket, SkipReason> {
        match mode {
            FetchMode::Reset => {
                self.supersede();
            }
            FetchMode::Extend(_) => {
                if self.in_flight.is_some() {
                    return Err(SkipReason::InFlight);
                }
                if let Some(last) = self.last_start
                    && now.saturating_duration_since(last) < self.throttle
                {
                    return Err(SkipReason::Throttled);
                }
            }
        }

        let ticket = FetchTicket {
            id: self.next_id,
            generation: self.generation,
            mode,
        };
        self.next_id += 1;
        self.in_flight = Some(ticket);
        self.last_start = Some(now);
        Ok(ticket)
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Release `ticket`'s in-flight slot. Returns whether its response may be
    /// applied. Safe to call more than once.
    pub fn finish(&mut self, ticket: &FetchTicket) -> bool {
        if self.in_flight.is_some_and(|t| t.id == ticket.id) {
            self.in_flight = None;
        }
        self.is_current(ticket)
    }
}
