//! OAuth token model and the provider trait the REST pipeline consumes.
//!
//! Expiry resolution follows the platform convention: when the service
//! reports an explicit expiry timestamp it wins; otherwise the expiry is the
//! acquisition instant plus the reported `expires_in` lifetime.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// A bearer token received from an OAuth authentication service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The token attached as the bearer credential.
    #[serde(rename = "access_token")]
    pub access_token: String,
    /// Token used to refresh the authentication, when the service issues one.
    #[serde(rename = "refresh_token", default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds from acquisition.
    #[serde(rename = "expires_in", default)]
    pub expires_in: i64,
    /// Explicit expiry as seconds from the Unix epoch, if the service
    /// reports one. Takes precedence over [`Self::expires_in`].
    #[serde(default)]
    pub expires_timestamp: Option<i64>,
    /// When the token was obtained.
    #[serde(default = "Utc::now")]
    pub acquired_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Build a token valid for `expires_in` seconds from now.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in,
            expires_timestamp: None,
            acquired_at: Utc::now(),
        }
    }

    /// The instant this token stops being valid.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self.expires_timestamp {
            Some(seconds) if seconds > 0 => {
                DateTime::from_timestamp(seconds, 0).unwrap_or(self.acquired_at)
            }
            _ => self.acquired_at + Duration::seconds(self.expires_in),
        }
    }

    /// Whether the token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Supplies the bearer credential for outbound REST requests.
///
/// Implementations own acquisition and refresh. The pipeline treats an
/// expired token as a precondition failure surfaced to the caller — it never
/// refreshes internally.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Produce the current token.
    async fn token(&self) -> Result<OAuthToken, AuthError>;
}

/// A provider that hands out one fixed token. Suitable for services
/// authenticated by long-lived keys, and for tests.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: OAuthToken,
}

impl StaticTokenProvider {
    /// Wrap a fixed token.
    #[must_use]
    pub fn new(token: OAuthToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<OAuthToken, AuthError> {
        Ok(self.token.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_from_lifetime() {
        let token = OAuthToken::new("tok", 3600);
        assert_eq!(token.expires_at(), token.acquired_at + Duration::hours(1));
    }

    #[test]
    fn explicit_timestamp_wins_over_lifetime() {
        let mut token = OAuthToken::new("tok", 3600);
        token.expires_timestamp = Some(1_700_000_000);
        assert_eq!(
            token.expires_at(),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn zero_timestamp_falls_back_to_lifetime() {
        let mut token = OAuthToken::new("tok", 60);
        token.expires_timestamp = Some(0);
        assert_eq!(token.expires_at(), token.acquired_at + Duration::seconds(60));
    }

    #[test]
    fn expiry_check() {
        let token = OAuthToken::new("tok", 60);
        assert!(!token.is_expired(token.acquired_at));
        assert!(token.is_expired(token.acquired_at + Duration::seconds(61)));
    }

    #[tokio::test]
    async fn static_provider_hands_out_its_token() {
        let provider = StaticTokenProvider::new(OAuthToken::new("fixed", 3600));
        let token = provider.token().await.unwrap();
        assert_eq!(token.access_token, "fixed");
    }

    #[test]
    fn deserializes_service_response_shape() {
        let token: OAuthToken = serde_json::from_str(
            r#"{"access_token":"abc","refresh_token":"def","expires_in":14400}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.refresh_token.as_deref(), Some("def"));
        assert_eq!(token.expires_in, 14400);
    }
}
