use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListwinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API error: {0}")]
    Api(String),

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("invalid cursor '{0}'")]
    InvalidCursor(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ListwinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ListwinError::InvalidCursor("abc".to_string()).to_string(),
            "invalid cursor 'abc'"
        );
        assert_eq!(
            ListwinError::RateLimited(60).to_string(),
            "rate limited, retry after 60 seconds"
        );
    }
}
