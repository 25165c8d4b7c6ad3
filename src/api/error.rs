//! HTTP error classification for List API responses.

use std::fmt;

use crate::error::ListwinError;

/// Seconds to report when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// A non-success response from the List API.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    pub status: reqwest::StatusCode,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Build from a response status and its headers.
    pub fn from_response(status: reqwest::StatusCode, headers: &reqwest::header::HeaderMap) -> Self {
        let retry_after = headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let reason = status.canonical_reason().unwrap_or("Unknown");
        Self {
            status,
            retry_after,
            message: format!("HTTP {} {}", status.as_u16(), reason),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == reqwest::StatusCode::TOO_MANY_REQUESTS
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for ListwinError {
    fn from(error: ApiError) -> Self {
        if error.is_rate_limited() {
            return ListwinError::RateLimited(error.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS));
        }
        ListwinError::Api(format!("list API error: {}", error.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_rate_limited_converts_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let error = ApiError::from_response(StatusCode::TOO_MANY_REQUESTS, &headers);

        assert!(error.is_rate_limited());
        assert!(matches!(ListwinError::from(error), ListwinError::RateLimited(7)));
    }

    #[test]
    fn test_rate_limited_defaults_to_sixty_seconds() {
        let error = ApiError::from_response(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new());
        assert!(matches!(ListwinError::from(error), ListwinError::RateLimited(60)));
    }

    #[test]
    fn test_server_error_message() {
        let error = ApiError::from_response(StatusCode::BAD_GATEWAY, &HeaderMap::new());
        assert!(!error.is_rate_limited());
        assert_eq!(error.to_string(), "HTTP 502 Bad Gateway");

        match ListwinError::from(error) {
            ListwinError::Api(msg) => assert!(msg.contains("502")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
