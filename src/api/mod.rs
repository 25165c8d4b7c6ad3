//! List API abstraction.
//!
//! The engine talks to exactly one collaborator: a keyset-paginated list
//! endpoint plus an unpaginated search endpoint. This module provides the
//! trait, the wire-independent request/response types, an HTTP adapter and an
//! in-process implementation.

pub mod error;
pub mod http;
pub mod memory;

use std::future::Future;

use crate::error::Result;
use crate::types::Record;
use crate::window::Cursor;

pub use error::ApiError;
pub use http::HttpListApi;
pub use memory::{ApiCall, MemoryListApi};

/// One page of a paginated list, already normalized.
#[derive(Debug, Clone)]
pub struct Page<R> {
    pub records: Vec<R>,
    /// Server claims more records exist past this page.
    pub has_next: bool,
    /// Collection size, when the server reported it.
    pub total: Option<u64>,
}

impl<R> Page<R> {
    pub fn new(records: Vec<R>, has_next: bool, total: Option<u64>) -> Self {
        Self {
            records,
            has_next,
            total,
        }
    }

    /// What a malformed response degrades to.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            has_next: false,
            total: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parameters of a single paginated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page_size: usize,
    pub cursor: Cursor,
}

impl PageQuery {
    pub fn new(page_size: usize, cursor: Cursor) -> Self {
        Self { page_size, cursor }
    }

    /// Query-string pairs in wire order. `beginID` is omitted for the sentinel.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pageSize", self.page_size.to_string()),
            ("forward", self.cursor.forward.to_string()),
            ("asc", self.cursor.asc.to_string()),
        ];
        if let Some(begin_id) = self.cursor.begin_param() {
            pairs.push(("beginID", begin_id));
        }
        pairs
    }
}

/// Identity of one list: where it lives and where its cursor is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEndpoint {
    /// Resource path relative to the API base, e.g. `api/admin/users`.
    pub resource: String,
    /// Search path; defaults to `<resource>/search`.
    pub search_resource: String,
    /// Key of the array inside `data` for search responses shaped as
    /// `{ data: { <plural>: [...] } }`.
    pub search_key: Option<String>,
    /// Cursor-cache key.
    pub cache_key: String,
}

impl ListEndpoint {
    pub fn new(resource: impl Into<String>) -> Self {
        let resource = resource.into().trim_matches('/').to_string();
        Self {
            search_resource: format!("{resource}/search"),
            cache_key: format!("{}_list_cache", resource.replace('/', "_")),
            search_key: None,
            resource,
        }
    }

    pub fn with_search_resource(mut self, path: impl Into<String>) -> Self {
        self.search_resource = path.into().trim_matches('/').to_string();
        self
    }

    pub fn with_search_key(mut self, key: impl Into<String>) -> Self {
        self.search_key = Some(key.into());
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }
}

/// Common interface for list backends.
pub trait ListApi: Send + Sync {
    type Record: Record;

    /// Fetch one page. Exactly one request per call, no retries.
    fn fetch_page(
        &self,
        endpoint: &ListEndpoint,
        query: &PageQuery,
    ) -> impl Future<Output = Result<Page<Self::Record>>> + Send;

    /// Unpaginated keyword search.
    fn search(
        &self,
        endpoint: &ListEndpoint,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<Self::Record>>> + Send;
}
