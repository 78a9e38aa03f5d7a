//! The request pipeline.
//!
//! One code path serves every verb: resolve the bearer credential, issue the
//! call, time it, then classify the outcome — throttled, quota-bearing,
//! failed, or successful. Requests run concurrently; the pipeline holds no
//! lock around the HTTP call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use reqwest::Method;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use rill_auth::{AuthError, TokenProvider};
use rill_settings::{ResetEpochUnit, RestSettings};

use crate::errors::RestError;
use crate::limits::{self, RateLimitSnapshot};

/// Capacity of the quota broadcast channel. Snapshots replace each other, so
/// a lagging observer losing old ones is by contract, not a defect.
const LIMITS_CHANNEL_CAPACITY: usize = 16;

/// A completed, successful request.
#[derive(Clone, Debug)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
    /// Wall-clock time the call took, attached for observability.
    pub elapsed: Duration,
}

impl RestResponse {
    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RestError> {
        serde_json::from_slice(&self.body).map_err(RestError::Decode)
    }
}

/// Rate-limit-aware HTTP client.
///
/// Cheap to clone is not a goal here — share it behind an [`Arc`] the way
/// the session shares its registry.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    reset_unit: ResetEpochUnit,
    tokens: Arc<dyn TokenProvider>,
    limits_tx: broadcast::Sender<RateLimitSnapshot>,
}

impl RestClient {
    /// Build a client from settings and a token provider.
    pub fn new(settings: &RestSettings, tokens: Arc<dyn TokenProvider>) -> Result<Self, RestError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;
        let (limits_tx, _) = broadcast::channel(LIMITS_CHANNEL_CAPACITY);
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            reset_unit: settings.reset_epoch_unit,
            tokens,
            limits_tx,
        })
    }

    /// Subscribe to quota snapshots published by this client.
    ///
    /// Publication is fire-and-forget: no observer is required to exist, and
    /// observers that need history must keep it themselves.
    #[must_use]
    pub fn rate_limit_updates(&self) -> broadcast::Receiver<RateLimitSnapshot> {
        self.limits_tx.subscribe()
    }

    /// Issue a request and classify the outcome.
    ///
    /// - 429 → [`RestError::RateLimited`] with bucket, any quota snapshot,
    ///   and the raw body — always, even when quota headers are present.
    /// - quota headers on any other response → one snapshot published.
    /// - other non-success status → [`RestError::Status`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RestResponse, RestError> {
        let token = self.tokens.token().await?;
        let now = Utc::now();
        if token.is_expired(now) {
            return Err(RestError::Auth(AuthError::TokenExpired {
                expired_at: token.expires_at().to_rfc3339(),
            }));
        }

        let url = self.url_for(path);
        debug!(%method, %url, "rest request");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&token.access_token)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let response = request.send().await?;
        let elapsed = started.elapsed();

        let status = response.status();
        let snapshot = RateLimitSnapshot::from_headers(response.headers(), self.reset_unit);
        let bucket = limits::bucket_name(response.headers());
        let body = response.bytes().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RestError::RateLimited {
                bucket,
                snapshot,
                body,
            });
        }
        if let Some(snapshot) = snapshot {
            debug!(
                bucket = %snapshot.bucket,
                remaining = snapshot.remaining,
                "quota update"
            );
            let _ = self.limits_tx.send(snapshot);
        }
        if !status.is_success() {
            return Err(RestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(RestResponse {
            status: status.as_u16(),
            body,
            elapsed,
        })
    }

    /// Issue a request and deserialize the body into `T`.
    ///
    /// A deserialization failure is [`RestError::Decode`] — "the server
    /// answered but the shape did not match", distinct from transport and
    /// status failures.
    pub async fn request_typed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, RestError> {
        self.request(method, path, body).await?.json()
    }

    /// GET `path`.
    pub async fn get(&self, path: &str) -> Result<RestResponse, RestError> {
        self.request(Method::GET, path, None).await
    }

    /// GET `path`, deserialized.
    pub async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        self.request_typed(Method::GET, path, None).await
    }

    /// POST `body` to `path`.
    pub async fn post(&self, path: &str, body: &Value) -> Result<RestResponse, RestError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// POST `body` to `path`, deserialized.
    pub async fn post_typed<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, RestError> {
        self.request_typed(Method::POST, path, Some(body)).await
    }

    /// PUT `body` to `path`.
    pub async fn put(&self, path: &str, body: &Value) -> Result<RestResponse, RestError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// PATCH `body` to `path`.
    pub async fn patch(&self, path: &str, body: &Value) -> Result<RestResponse, RestError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> Result<RestResponse, RestError> {
        self.request(Method::DELETE, path, None).await
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::DateTime;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use rill_auth::{OAuthToken, StaticTokenProvider};

    use super::*;
    use crate::limits::{ALLOWED_HEADER, BUCKET_HEADER, REMAINING_HEADER, RESET_HEADER};

    fn client_for(server: &MockServer) -> RestClient {
        client_with_unit(server, ResetEpochUnit::Milliseconds)
    }

    fn client_with_unit(server: &MockServer, unit: ResetEpochUnit) -> RestClient {
        let settings = RestSettings {
            base_url: server.uri(),
            request_timeout_ms: 5_000,
            reset_epoch_unit: unit,
        };
        let tokens = Arc::new(StaticTokenProvider::new(OAuthToken::new("tok", 3600)));
        RestClient::new(&settings, tokens).unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct User {
        id: String,
    }

    #[tokio::test]
    async fn success_returns_body_and_elapsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "44"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.get("users").await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.elapsed > Duration::ZERO);
        let user: User = response.json().unwrap();
        assert_eq!(user.id, "44");
    }

    #[tokio::test]
    async fn quota_headers_publish_exactly_one_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "44"}))
                    .insert_header(ALLOWED_HEADER, "1000")
                    .insert_header(REMAINING_HEADER, "997")
                    .insert_header(RESET_HEADER, "1700000000000"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut updates = client.rate_limit_updates();
        let _ = client.get("users").await.unwrap();

        let snapshot = updates.recv().await.unwrap();
        assert_eq!(snapshot.allowed, 1000);
        assert_eq!(snapshot.remaining, 997);
        assert_eq!(
            snapshot.resets_at,
            DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
        );
        // exactly one
        assert_matches!(
            updates.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        );
    }

    #[tokio::test]
    async fn throttled_response_is_rate_limited_even_with_quota_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string("{\"partial\":true}")
                    .insert_header(ALLOWED_HEADER, "1000")
                    .insert_header(REMAINING_HEADER, "0")
                    .insert_header(BUCKET_HEADER, "channels"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut updates = client.rate_limit_updates();
        let err = client.get("users").await.unwrap_err();

        let RestError::RateLimited {
            bucket,
            snapshot,
            body,
        } = err
        else {
            panic!("expected rate limited, got {err:?}");
        };
        assert_eq!(bucket, "channels");
        assert_eq!(snapshot.unwrap().remaining, 0);
        assert_eq!(&body[..], b"{\"partial\":true}");
        // throttled responses never publish
        assert_matches!(
            updates.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        );
    }

    #[tokio::test]
    async fn throttled_response_without_bucket_uses_global() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_matches!(
            client.get("users").await.unwrap_err(),
            RestError::RateLimited { bucket, snapshot: None, .. } if bucket == "global"
        );
    }

    #[tokio::test]
    async fn other_failure_statuses_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get("users").await.unwrap_err();
        assert_matches!(err, RestError::Status { status: 404, ref body } if &body[..] == b"missing");
    }

    #[tokio::test]
    async fn typed_request_distinguishes_shape_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_typed::<User>("users").await.unwrap_err();
        assert_matches!(err, RestError::Decode(_));
    }

    #[tokio::test]
    async fn expired_token_fails_before_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let settings = RestSettings {
            base_url: server.uri(),
            ..RestSettings::default()
        };
        let tokens = Arc::new(StaticTokenProvider::new(OAuthToken::new("tok", -60)));
        let client = RestClient::new(&settings, tokens).unwrap();
        assert_matches!(
            client.get("users").await.unwrap_err(),
            RestError::Auth(AuthError::TokenExpired { .. })
        );
    }

    #[tokio::test]
    async fn reset_unit_seconds_is_respected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(ALLOWED_HEADER, "10")
                    .insert_header(RESET_HEADER, "1700000000"),
            )
            .mount(&server)
            .await;

        let client = client_with_unit(&server, ResetEpochUnit::Seconds);
        let mut updates = client.rate_limit_updates();
        let _ = client.get("x").await.unwrap();
        let snapshot = updates.recv().await.unwrap();
        assert_eq!(
            snapshot.resets_at,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(wiremock::matchers::body_json(json!({"text": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let user: User = client.post_typed("messages", &json!({"text": "hi"})).await.unwrap();
        assert_eq!(user.id, "1");
    }
}
