//! Error types returned by the client

use thiserror::Error;

/// Main error type for SFTPGo API operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid client configuration (missing credentials, bad base URL).
    /// Raised at construction time, before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure (DNS, connection refused, timeout)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status other than the expected one.
    /// Carries the raw response body for diagnostics.
    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    /// A request payload could not be serialized to JSON
    #[error("request serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A response body could not be decoded into the expected shape
    #[error("response deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// True if the error is a status error with code 404.
    ///
    /// Callers use this to distinguish "resource does not exist" from
    /// other failures when reconciling remote state.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404, .. })
    }

    /// True if the error signals transient backend contention and the
    /// request is worth resending.
    ///
    /// Only status errors whose body matches the contention pattern
    /// qualify; transport errors, auth failures and validation errors
    /// are all terminal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { body, .. } => is_transient_contention(body),
            _ => false,
        }
    }
}

/// Transient-contention classifier.
///
/// SFTPGo surfaces database deadlocks in the error body, either as the
/// word "deadlock" (PostgreSQL, CockroachDB) or as MySQL error code
/// 1213. Matched patterns live here so call sites never string-match
/// themselves.
fn is_transient_contention(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("deadlock") || lowered.contains("error 1213")
}
