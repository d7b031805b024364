//! Credentials and bearer-token lifecycle
//!
//! The server issues short-lived bearer tokens through a basic-auth
//! login exchange. [`TokenManager`] caches the current token behind a
//! reader/writer lock and treats it as already expired a safety margin
//! before the server would, so an in-flight request never races the
//! server's clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

/// Treat a token as expired this long before its actual expiry
const EXPIRY_SAFETY_MARGIN_SECS: i64 = 120;

/// Authentication material supplied once at client construction.
///
/// Exactly one branch is populated for the lifetime of the client: an
/// API key bypasses the login exchange entirely, a username/password
/// pair is traded for time-limited tokens on demand.
#[derive(Clone)]
pub enum Credentials {
    /// Long-lived static key sent verbatim in `X-SFTPGO-API-KEY`
    ApiKey(String),
    /// Exchanged for a bearer token via `GET /api/v2/token`
    Password { username: String, password: String },
}

// Credentials end up in error context and debug logs; never print the
// secret itself.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// A bearer token with its absolute expiry, as returned by the token
/// endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccessToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// True if the token is expired or within the safety margin of it
    fn is_expired(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }
}

/// Thread-safe cache for the current bearer token.
///
/// Reads (validity checks) proceed concurrently; a renewal takes the
/// write lock. A best-effort race where two callers both observe an
/// expired token and each perform a login exchange is tolerated; the
/// second write simply wins.
#[derive(Debug)]
pub(crate) struct TokenManager {
    token: RwLock<Option<AccessToken>>,
    margin: Duration,
}

impl TokenManager {
    pub(crate) fn new() -> Self {
        Self {
            token: RwLock::new(None),
            margin: Duration::seconds(EXPIRY_SAFETY_MARGIN_SECS),
        }
    }

    /// Return the cached token only if it is still valid beyond the
    /// safety margin. `None` means the caller must renew first.
    pub(crate) async fn get(&self) -> Option<String> {
        let guard = self.token.read().await;
        match guard.as_ref() {
            Some(token) if !token.is_expired(self.margin) => Some(token.access_token.clone()),
            _ => None,
        }
    }

    /// Atomically replace the cached token/expiry pair
    pub(crate) async fn set(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }
}
