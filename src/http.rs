//! Request execution with auth-header injection and retry
//!
//! [`Executor`] owns the underlying HTTP connection pool for the
//! lifetime of the client and is shared by every concurrent operation
//! issued through it. It injects authentication (renewing the bearer
//! token synchronously when missing or near expiry), enforces the
//! single expected success status per call, and wraps sends in the
//! retry policy for transient backend contention.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{AccessToken, Credentials, TokenManager};
use crate::config::{ClientConfig, KeyValue};
use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;

const TOKEN_PATH: &str = "/api/v2/token";
const API_KEY_HEADER: &str = "X-SFTPGO-API-KEY";

/// Shared request executor behind [`SftpgoClient`](crate::SftpgoClient)
#[derive(Debug)]
pub(crate) struct Executor {
    http: ReqwestClient,
    base_url: String,
    credentials: Credentials,
    tokens: TokenManager,
    headers: Vec<KeyValue>,
    retry: RetryPolicy,
}

impl Executor {
    /// Validate credentials and build the HTTP transport.
    ///
    /// Fails fast with a configuration error before any network call
    /// when credentials are incomplete or the base URL is invalid.
    pub(crate) fn new(config: &ClientConfig, credentials: Credentials) -> Result<Self> {
        match &credentials {
            Credentials::ApiKey(key) if key.is_empty() => {
                return Err(ClientError::Config("API key must not be empty".to_string()));
            }
            Credentials::Password { username, password }
                if username.is_empty() || password.is_empty() =>
            {
                return Err(ClientError::Config(
                    "username and password are both required".to_string(),
                ));
            }
            _ => {}
        }

        Url::parse(&config.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL: {e}")))?;

        let http = ReqwestClient::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            tokens: TokenManager::new(),
            headers: config.headers.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Send a request, resending on transient backend contention.
    ///
    /// Up to `max_retries` additional attempts; the backoff wait only
    /// happens between attempts and the last error is returned
    /// verbatim once retries are exhausted. Intermediate failures are
    /// invisible to the caller.
    pub(crate) async fn send_with_retry(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        expected: StatusCode,
    ) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.send(method.clone(), path, query, body.clone(), expected).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries() => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    warn!(
                        %method,
                        path,
                        attempt,
                        max_retries = self.retry.max_retries(),
                        delay_ms = delay.as_millis() as u64,
                        "transient backend contention, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send a single request and enforce the expected success status.
    ///
    /// Header injection order: auth header, then configured static
    /// headers (which may override), then `Content-Type` iff a body is
    /// present. The full response body is read either way, so a failed
    /// call carries its diagnostics.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        expected: StatusCode,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        let mut headers = HeaderMap::new();

        match &self.credentials {
            Credentials::ApiKey(key) => {
                headers.insert(
                    HeaderName::from_static("x-sftpgo-api-key"),
                    header_value(API_KEY_HEADER, key)?,
                );
            }
            Credentials::Password { .. } => {
                let token = match self.tokens.get().await {
                    Some(token) => token,
                    None => self.authenticate().await?,
                };
                headers.insert(AUTHORIZATION, header_value("Authorization", &format!("Bearer {token}"))?);
            }
        }

        for kv in &self.headers {
            let name = HeaderName::from_bytes(kv.key.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name: {}", kv.key)))?;
            headers.insert(name, header_value(&kv.key, &kv.value)?);
        }

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(bytes) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        debug!(%method, path, "sending request");
        let response = request.send().await?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "received response");

        let bytes = response.bytes().await?;
        if status != expected {
            return Err(ClientError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }

    /// Perform the login exchange and cache the resulting token.
    ///
    /// Not wrapped in the retry loop on its own: credential failures
    /// are not transient, and the contention classifier never matches
    /// them.
    async fn authenticate(&self) -> Result<String> {
        let Credentials::Password { username, password } = &self.credentials else {
            return Err(ClientError::Config(
                "token exchange requires username/password credentials".to_string(),
            ));
        };

        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response = self.http.get(&url).basic_auth(username, Some(password)).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if status != StatusCode::OK {
            return Err(ClientError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let token: AccessToken =
            serde_json::from_slice(&bytes).map_err(ClientError::Deserialization)?;
        let access_token = token.access_token.clone();
        self.tokens.set(token).await;
        info!("renewed access token");

        Ok(access_token)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ClientError::Config(format!("invalid value for header {name}")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::config::Edition;

    fn password_credentials() -> Credentials {
        Credentials::Password {
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new()
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(4))
            .with_jitter_percent(0)
    }

    fn executor(base_url: &str, credentials: Credentials) -> Executor {
        let config = ClientConfig::builder(base_url)
            .edition(Edition::Community)
            .retry(fast_retry())
            .build();
        Executor::new(&config, credentials).expect("executor")
    }

    fn token_body(expires_in_secs: i64) -> serde_json::Value {
        json!({
            "access_token": "test-token",
            "expires_at": (Utc::now() + chrono::Duration::seconds(expires_in_secs)).to_rfc3339(),
        })
    }

    async fn mount_token_endpoint(server: &MockServer, expires_in_secs: i64, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v2/token"))
            // admin:secret
            .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(expires_in_secs)))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn empty_api_key_is_a_config_error() {
        let config = ClientConfig::builder("http://localhost:8080").build();
        let result = Executor::new(&config, Credentials::ApiKey(String::new()));

        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn missing_password_is_a_config_error() {
        let config = ClientConfig::builder("http://localhost:8080").build();
        let result = Executor::new(
            &config,
            Credentials::Password { username: "admin".to_string(), password: String::new() },
        );

        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = ClientConfig::builder("not a url").build();
        let result = Executor::new(&config, password_credentials());

        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn token_is_cached_across_requests() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 3600, 1).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), password_credentials());
        exec.send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK).await.unwrap();
        exec.send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK).await.unwrap();
    }

    #[tokio::test]
    async fn near_expiry_token_triggers_renewal() {
        let server = MockServer::start().await;
        // 60s lifetime: inside the 2 minute safety margin, so every
        // request renews first
        mount_token_endpoint(&server, 60, 2).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), password_credentials());
        exec.send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK).await.unwrap();
        exec.send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK).await.unwrap();
    }

    #[tokio::test]
    async fn api_key_skips_login_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .and(header("X-SFTPGO-API-KEY", "my-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), Credentials::ApiKey("my-key".to_string()));
        exec.send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK).await.unwrap();
    }

    #[tokio::test]
    async fn static_headers_are_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .and(header("X-Request-Source", "terraform"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = ClientConfig::builder(server.uri())
            .header("X-Request-Source", "terraform")
            .build();
        let exec = Executor::new(&config, Credentials::ApiKey("k".to_string())).unwrap();
        exec.send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK).await.unwrap();
    }

    #[tokio::test]
    async fn content_type_set_only_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/things"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), Credentials::ApiKey("k".to_string()));
        exec.send(
            Method::POST,
            "/api/v2/things",
            &[],
            Some(b"{}".to_vec()),
            StatusCode::CREATED,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn unexpected_status_carries_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such object"))
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), Credentials::ApiKey("k".to_string()));
        let err = exec
            .send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK)
            .await
            .unwrap_err();

        match err {
            ClientError::Status { code, body } => {
                assert_eq!(code, 404);
                assert_eq!(body, "no such object");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(exec
            .send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn failed_login_propagates_as_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), password_credentials());
        let err = exec
            .send(Method::GET, "/api/v2/status", &[], None, StatusCode::OK)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status { code: 401, .. }));
    }

    #[tokio::test]
    async fn retries_deadlock_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .respond_with(move |_req: &Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(500)
                        .set_body_string("Error 1213: Deadlock found when trying to get lock")
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), Credentials::ApiKey("k".to_string()));
        exec.send_with_retry(Method::GET, "/api/v2/status", &[], None, StatusCode::OK)
            .await
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .respond_with(ResponseTemplate::new(400).set_body_string("validation error"))
            .expect(1)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), Credentials::ApiKey("k".to_string()));
        let err = exec
            .send_with_retry(Method::GET, "/api/v2/status", &[], None, StatusCode::OK)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status { code: 400, .. }));
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let server = MockServer::start().await;
        // 1 initial send + 3 retries
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("deadlock detected"))
            .expect(4)
            .mount(&server)
            .await;

        let exec = executor(&server.uri(), Credentials::ApiKey("k".to_string()));
        let err = exec
            .send_with_retry(Method::GET, "/api/v2/status", &[], None, StatusCode::OK)
            .await
            .unwrap_err();

        match err {
            ClientError::Status { code, body } => {
                assert_eq!(code, 500);
                assert!(body.contains("deadlock"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
