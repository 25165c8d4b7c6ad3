//! reqwest-backed List API adapter.
//!
//! Response shapes vary between list views, so everything is normalized here
//! before it reaches the merger:
//!
//! ```text
//! GET <resource>?pageSize=&forward=&asc=&beginID=
//!     -> { "data": [...], "meta": { "total": n, "has_next": bool } }
//! GET <resource>/search?keyword=
//!     -> { "data": [...] }  or  { "data": { "<plural>": [...] } }
//! ```
//!
//! A body that does not match degrades to an empty page rather than an error.

use std::marker::PhantomData;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{ListwinError, Result};
use crate::types::Record;

use super::error::ApiError;
use super::{ListApi, ListEndpoint, Page, PageQuery};

/// List API client over HTTP.
pub struct HttpListApi<R> {
    client: Client,
    base_url: Url,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpListApi<R> {
    /// Create a client from configuration.
    ///
    /// Configures the HTTP client with a 10s connect timeout and the
    /// configured request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.base_url().ok_or_else(|| {
            ListwinError::Config(
                "base URL not configured. Set LISTWIN_BASE_URL or run: listwin config set base_url <url>"
                    .to_string(),
            )
        })?;
        Self::new(&base_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            _record: PhantomData,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a resource path against the base URL.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        tracing::debug!(%url, "list API request");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_response(status, response.headers()).into());
        }

        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("list API returned a non-JSON body: {e}");
                Ok(Value::Null)
            }
        }
    }
}

impl<R> ListApi for HttpListApi<R>
where
    R: Record + DeserializeOwned,
{
    type Record = R;

    async fn fetch_page(&self, endpoint: &ListEndpoint, query: &PageQuery) -> Result<Page<R>> {
        let mut url = self.endpoint_url(&endpoint.resource)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
        }

        let body = self.get_json(url).await?;
        let page = normalize_page(body);
        tracing::debug!(
            records = page.len(),
            has_next = page.has_next,
            total = ?page.total,
            "list API page"
        );
        Ok(page)
    }

    async fn search(&self, endpoint: &ListEndpoint, keyword: &str) -> Result<Vec<R>> {
        let mut url = self.endpoint_url(&endpoint.search_resource)?;
        url.query_pairs_mut().append_pair("keyword", keyword);

        let body = self.get_json(url).await?;
        Ok(normalize_search(body, endpoint.search_key.as_deref()))
    }
}

/// Ensure the base ends in `/` so `Url::join` appends rather than replaces
/// the last segment.
fn normalize_base(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ListwinError::Config("base URL is empty".to_string()));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}

/// Turn a list response body into a page.
pub fn normalize_page<R: DeserializeOwned>(body: Value) -> Page<R> {
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        tracing::warn!("list response has no `data` array, treating as empty page");
        return Page::empty();
    };

    let records = decode_records(data);
    let meta = body.get("meta");
    let has_next = meta
        .and_then(|m| m.get("has_next"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let total = meta.and_then(|m| m.get("total")).and_then(Value::as_u64);

    if meta.is_none() {
        tracing::warn!("list response has no `meta`, assuming no further pages");
    }

    Page::new(records, has_next, total)
}

/// Turn a search response body into records.
///
/// Accepts `data` as an array, or as an object holding the array under
/// `search_key`, or under its only array-valued field.
pub fn normalize_search<R: DeserializeOwned>(body: Value, search_key: Option<&str>) -> Vec<R> {
    let data = match body.get("data") {
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => {
            let keyed = search_key.and_then(|key| map.get(key)).and_then(Value::as_array);
            let sole = || {
                let mut arrays = map.values().filter_map(Value::as_array);
                match (arrays.next(), arrays.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            };
            match keyed.or_else(sole) {
                Some(items) => items,
                None => {
                    tracing::warn!("search response `data` holds no recognizable result array");
                    return Vec::new();
                }
            }
        }
        _ => {
            tracing::warn!("search response has no `data`, treating as no results");
            return Vec::new();
        }
    };

    decode_records(data)
}

fn decode_records<R: DeserializeOwned>(items: &[Value]) -> Vec<R> {
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<R>(item.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping undecodable record: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsonRecord;
    use serde_json::json;

    #[test]
    fn test_normalize_page_full_shape() {
        let body = json!({
            "data": [{"id": 109, "name": "a"}, {"id": 108, "name": "b"}],
            "meta": {"total": 200, "has_next": true}
        });
        let page: Page<JsonRecord> = normalize_page(body);
        assert_eq!(page.len(), 2);
        assert!(page.has_next);
        assert_eq!(page.total, Some(200));
        assert_eq!(page.records[0].label(), Some("a"));
    }

    #[test]
    fn test_normalize_page_missing_data_is_empty() {
        let page: Page<JsonRecord> = normalize_page(json!({"meta": {"total": 3}}));
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.total, None);

        let page: Page<JsonRecord> = normalize_page(Value::Null);
        assert!(page.is_empty());
    }

    #[test]
    fn test_normalize_page_missing_meta() {
        let page: Page<JsonRecord> = normalize_page(json!({"data": [{"id": 1}]}));
        assert_eq!(page.len(), 1);
        assert!(!page.has_next);
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_normalize_page_skips_records_without_id() {
        let page: Page<JsonRecord> =
            normalize_page(json!({"data": [{"id": 1}, {"name": "orphan"}], "meta": {}}));
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_normalize_search_array() {
        let records: Vec<JsonRecord> = normalize_search(json!({"data": [{"id": 5}]}), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 5);
    }

    #[test]
    fn test_normalize_search_keyed_object() {
        let body = json!({"data": {"classes": [{"id": 1}, {"id": 2}], "count": 2}});
        let records: Vec<JsonRecord> = normalize_search(body.clone(), Some("classes"));
        assert_eq!(records.len(), 2);

        // Without a key the sole array is used.
        let records: Vec<JsonRecord> = normalize_search(body, None);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_normalize_search_ambiguous_object() {
        let body = json!({"data": {"a": [{"id": 1}], "b": [{"id": 2}]}});
        let records: Vec<JsonRecord> = normalize_search(body, None);
        assert!(records.is_empty());
    }

    #[test]
    fn test_endpoint_url_joins_under_base_path() {
        let api: HttpListApi<JsonRecord> =
            HttpListApi::new("http://localhost:8080/v1", Duration::from_secs(5)).unwrap();
        let url = api.endpoint_url("/api/admin/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/api/admin/users");
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(HttpListApi::<JsonRecord>::new("  ", Duration::from_secs(5)).is_err());
    }
}
