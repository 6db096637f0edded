//! HTTP access to block indexers and node RPC endpoints.
//!
//! Each client owns a [`reqwest::Client`] built from [`HttpConfig`]; nothing
//! is cached between calls.

pub mod blockcypher;
pub mod esplora;
pub mod indexer;
pub mod json_rpc;
pub mod trongrid;

use std::time::Duration;

use crate::config::HttpConfig;

/// Errors any provider may return.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Timeouts, connection failures, rate limiting and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Rpc { .. } | ProviderError::InvalidResponse(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Shared client settings for every provider.
pub fn http_client(config: &HttpConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("wallet-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {e}")))
}

/// Turn a non-2xx response into [`ProviderError::Status`] carrying the body.
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body: body.chars().take(512).collect(),
    })
}

/// `base` + `path` without doubling or dropping the separator.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        let status = |s| ProviderError::Status {
            status: s,
            body: String::new(),
        };
        assert!(status(500).is_retryable());
        assert!(status(502).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(status(404).is_not_found());
    }

    #[test]
    fn rpc_errors_are_terminal() {
        let err = ProviderError::Rpc {
            code: -32000,
            message: "nonce too low".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "RPC error -32000: nonce too low");
    }

    #[test]
    fn joins_urls() {
        assert_eq!(join_url("https://a/api/", "/tx"), "https://a/api/tx");
        assert_eq!(join_url("https://a/api", "tx"), "https://a/api/tx");
    }

    #[test]
    fn client_builds_with_defaults() {
        assert!(http_client(&HttpConfig::default()).is_ok());
    }
}
