//! Client configuration
//!
//! The base endpoint and per-request deadline are explicit construction
//! inputs rather than process-wide globals.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the remote recording service client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the service API, e.g. `http://localhost:8000/api`
    pub base_url: String,

    /// Per-request deadline in milliseconds
    pub timeout_ms: u64,
}

impl ClientConfig {
    /// Create a config for the given endpoint with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }

    /// Override the per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api")
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_normalized() {
        let config = ClientConfig::new("http://localhost:8000/api/");
        assert_eq!(config.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_default_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_with_timeout() {
        let config = ClientConfig::new("http://example.test/api")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout_ms, 250);
    }
}
