//! REST pipeline error types.
//!
//! The taxonomy keeps three remediation classes distinguishable:
//! network/transport problems ([`RestError::Http`]), protocol/shape
//! mismatches ([`RestError::Decode`]), and server-imposed throttling
//! ([`RestError::RateLimited`]). Retry with backoff is appropriate for the
//! first and last; a shape mismatch is a compatibility bug to report, not
//! something to retry blindly.

use bytes::Bytes;

use rill_auth::AuthError;

use crate::limits::RateLimitSnapshot;

/// Errors that can occur in the REST pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Transport-level failure (connect, timeout, TLS, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential precondition failed before the request was issued.
    #[error("auth precondition failed: {0}")]
    Auth(#[from] AuthError),

    /// The server throttled the request (status 429).
    #[error("rate limited on bucket {bucket}")]
    RateLimited {
        /// The bucket being throttled.
        bucket: String,
        /// Quota snapshot, when the throttled response also carried quota
        /// headers.
        snapshot: Option<RateLimitSnapshot>,
        /// Raw response body. Deliberately unparsed — callers that want the
        /// partial data decide how to read it.
        body: Bytes,
    },

    /// Any other non-success HTTP status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: Bytes,
    },

    /// The server answered but the body did not match the expected shape.
    #[error("response decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl RestError {
    /// Whether retrying (with backoff) is a reasonable remediation.
    ///
    /// Shape mismatches and auth precondition failures are never retryable:
    /// the same request would fail the same way.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Auth(_) | Self::Decode(_) => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display_names_the_bucket() {
        let err = RestError::RateLimited {
            bucket: "channels".to_string(),
            snapshot: None,
            body: Bytes::new(),
        };
        assert_eq!(err.to_string(), "rate limited on bucket channels");
    }

    #[test]
    fn rate_limited_is_retryable() {
        let err = RestError::RateLimited {
            bucket: "global".to_string(),
            snapshot: None,
            body: Bytes::new(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = RestError::Status {
            status: 503,
            body: Bytes::new(),
        };
        let client = RestError::Status {
            status: 404,
            body: Bytes::new(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
    }

    #[test]
    fn decode_is_not_retryable() {
        let err = RestError::Decode(serde_json::from_str::<u32>("\"x\"").unwrap_err());
        assert!(!err.is_retryable());
    }
}
