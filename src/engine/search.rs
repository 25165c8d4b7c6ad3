//! Search-mode bookkeeping.
//!
//! Every keyword change gets a sequence number. A debounced request only
//! proceeds, and its response is only applied, while its number is still the
//! latest one.

#[derive(Debug, Default, Clone)]
pub struct SearchState {
    keyword: String,
    seq: u64,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search mode is active while the keyword is non-empty.
    pub fn is_active(&self) -> bool {
        !self.keyword.is_empty()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.is_active().then_some(self.keyword.as_str())
    }

    /// Record a keyword change. Returns its sequence number and whether
    /// search mode was active before.
    pub fn update(&mut self, keyword: &str) -> (u64, bool) {
        let was_active = self.is_active();
        self.keyword = keyword.trim().to_string();
        self.seq += 1;
        (self.seq, was_active)
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.seq == seq && self.is_active()
    }
}
