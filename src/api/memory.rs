//! In-process List API.
//!
//! Serves a collection held in memory with the same keyset rules as the HTTP
//! backend (`beginID` is exclusive, `pageSize + 1` probing for `has_next`).
//! Every call is recorded, and calls can be delayed or made to fail, which is
//! what the engine tests drive it with.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{ListwinError, Result};
use crate::types::{Record, RecordId, SortOrder};

use super::{ListApi, ListEndpoint, Page, PageQuery};

/// A request the backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Page { resource: String, query: PageQuery },
    Search { resource: String, keyword: String },
}

#[derive(Debug, Default)]
struct Behavior {
    /// Delay applied to each following call.
    delay: Option<Duration>,
    /// One-shot delays consumed in call order, ahead of `delay`.
    scripted_delays: Vec<Duration>,
    /// Number of following calls that fail.
    failures: usize,
    /// Number of following page calls answered with an empty, malformed page.
    malformed: usize,
}

pub struct MemoryListApi<R> {
    records: Mutex<Vec<R>>,
    search_results: Mutex<HashMap<String, Vec<R>>>,
    calls: Mutex<Vec<ApiCall>>,
    behavior: Mutex<Behavior>,
}

impl<R: Record> MemoryListApi<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(records),
            search_results: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            behavior: Mutex::new(Behavior::default()),
        }
    }

    /// Answer `keyword` searches with `results`.
    pub fn set_search_results(&self, keyword: &str, results: Vec<R>) {
        self.search_results.lock().insert(keyword.to_string(), results);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.behavior.lock().delay = delay;
    }

    /// Delay only the next call by `delay`. Queued delays apply in order.
    pub fn push_delay(&self, delay: Duration) {
        self.behavior.lock().scripted_delays.push(delay);
    }

    /// Make the next `count` calls fail with an API error.
    pub fn fail_next(&self, count: usize) {
        self.behavior.lock().failures = count;
    }

    /// Make the next `count` page calls return a body without `data`/`meta`.
    pub fn malform_next(&self, count: usize) {
        self.behavior.lock().malformed = count;
    }

    pub fn insert(&self, record: R) {
        let mut records = self.records.lock();
        records.retain(|r| r.record_id() != record.record_id());
        records.push(record);
    }

    pub fn remove(&self, id: RecordId) {
        self.records.lock().retain(|r| r.record_id() != id);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Queries of the page calls received so far.
    pub fn page_queries(&self) -> Vec<PageQuery> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ApiCall::Page { query, .. } => Some(*query),
                ApiCall::Search { .. } => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Record the call and settle delay/failure for it.
    async fn begin_call(&self, call: ApiCall) -> Result<bool> {
        let is_page = matches!(call, ApiCall::Page { .. });
        self.calls.lock().push(call);

        let (delay, fail, malformed) = {
            let mut behavior = self.behavior.lock();
            let delay = if behavior.scripted_delays.is_empty() {
                behavior.delay
            } else {
                Some(behavior.scripted_delays.remove(0))
            };
            let fail = behavior.failures > 0;
            if fail {
                behavior.failures -= 1;
            }
            let malformed = is_page && !fail && behavior.malformed > 0;
            if malformed {
                behavior.malformed -= 1;
            }
            (delay, fail, malformed)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ListwinError::Api("injected failure".to_string()));
        }
        Ok(malformed)
    }

    /// Keyset page over the current records.
    fn select(&self, query: &PageQuery) -> Page<R> {
        let order = query.cursor.order();
        let mut sorted = self.records.lock().clone();
        sorted.sort_by_key(|r| r.record_id());
        if order == SortOrder::Desc {
            sorted.reverse();
        }
        let total = sorted.len() as u64;
        let page_size = query.page_size.max(1);
        let begin = query.cursor.begin_id;

        if query.cursor.is_sentinel() {
            let has_next = sorted.len() > page_size;
            sorted.truncate(page_size);
            return Page::new(sorted, has_next, Some(total));
        }

        if query.cursor.forward {
            let mut after: Vec<R> = sorted
                .into_iter()
                .filter(|r| order.precedes(begin, r.record_id()))
                .collect();
            let has_next = after.len() > page_size;
            after.truncate(page_size);
            Page::new(after, has_next, Some(total))
        } else {
            // Nearest records above `begin`, still in display order.
            let mut before: Vec<R> = sorted
                .into_iter()
                .filter(|r| order.precedes(r.record_id(), begin))
                .collect();
            let has_next = before.len() > page_size;
            let skip = before.len().saturating_sub(page_size);
            before.drain(..skip);
            Page::new(before, has_next, Some(total))
        }
    }
}

impl<R: Record> ListApi for MemoryListApi<R> {
    type Record = R;

    async fn fetch_page(&self, endpoint: &ListEndpoint, query: &PageQuery) -> Result<Page<R>> {
        let malformed = self
            .begin_call(ApiCall::Page {
                resource: endpoint.resource.clone(),
                query: *query,
            })
            .await?;
        if malformed {
            return Ok(Page::empty());
        }
        Ok(self.select(query))
    }

    async fn search(&self, endpoint: &ListEndpoint, keyword: &str) -> Result<Vec<R>> {
        self.begin_call(ApiCall::Search {
            resource: endpoint.search_resource.clone(),
            keyword: keyword.to_string(),
        })
        .await?;
        Ok(self
            .search_results
            .lock()
            .get(keyword)
            .cloned()
            .unwrap_or_default())
    }
}
