//! Client configuration

use std::time::Duration;

use crate::retry::RetryPolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A static header applied to every outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Server edition the client talks to.
///
/// Enterprise deployments return confidential fields (hashed secrets)
/// on user/admin reads when asked; the flag only toggles that query
/// parameter, never the request flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edition {
    #[default]
    Community,
    Enterprise,
}

/// Configuration for [`SftpgoClient`](crate::SftpgoClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) headers: Vec<KeyValue>,
    pub(crate) edition: Edition,
    pub(crate) retry: RetryPolicy,
}

impl ClientConfig {
    /// Start building a configuration for the given server base URL
    /// (e.g. `https://sftpgo.example.com:8080`).
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            headers: Vec::new(),
            edition: Edition::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    timeout: Duration,
    headers: Vec<KeyValue>,
    edition: Edition,
    retry: RetryPolicy,
}

impl ClientConfigBuilder {
    /// Overall HTTP timeout per request attempt
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a static header sent with every request. Static headers are
    /// applied after the auth header, so they may override defaults.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(KeyValue { key: key.into(), value: value.into() });
        self
    }

    pub fn edition(mut self, edition: Edition) -> Self {
        self.edition = edition;
        self
    }

    /// Override the retry policy for transient backend contention
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url,
            timeout: self.timeout,
            headers: self.headers,
            edition: self.edition,
            retry: self.retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = ClientConfig::builder("http://localhost:8080").build();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.headers.is_empty());
        assert_eq!(config.edition, Edition::Community);
    }

    #[test]
    fn builder_collects_headers_in_order() {
        let config = ClientConfig::builder("http://localhost:8080")
            .header("X-Custom", "1")
            .header("User-Agent", "terraform")
            .build();

        assert_eq!(config.headers.len(), 2);
        assert_eq!(config.headers[0].key, "X-Custom");
        assert_eq!(config.headers[1].value, "terraform");
    }
}
