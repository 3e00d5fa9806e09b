use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the data-fetch layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {}", .reason.as_deref().unwrap_or("no details"))]
    Status {
        url: String,
        status: u16,
        /// `message` from the error payload, when the server sent one.
        reason: Option<String>,
    },

    #[error("malformed JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response from {url}: {reason}")]
    Validation { url: String, reason: String },

    #[error("{0}")]
    Upload(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Transport failure or non-success status.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Status { .. })
    }

    pub fn validation(url: &str, reason: impl Into<String>) -> Self {
        ApiError::Validation {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_and_class() {
        let err = ApiError::Status {
            url: "http://h/api/analysis".into(),
            status: 400,
            reason: Some("unknown symbol".into()),
        };
        assert!(err.is_network());
        assert_eq!(
            err.to_string(),
            "http://h/api/analysis returned HTTP 400: unknown symbol"
        );
        let bare = ApiError::Status {
            url: "u".into(),
            status: 502,
            reason: None,
        };
        assert_eq!(bare.to_string(), "u returned HTTP 502: no details");
        assert!(!ApiError::validation("u", "missing field").is_network());
        assert!(!ApiError::Upload("Error uploading PDF".into()).is_network());
    }
}
