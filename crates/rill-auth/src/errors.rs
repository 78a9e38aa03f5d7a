//! Auth error types.

/// Errors that can occur while supplying credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The held token has passed its expiry instant.
    #[error("token expired at {expired_at}")]
    TokenExpired {
        /// RFC 3339 rendering of the expiry instant.
        expired_at: String,
    },

    /// No credential is configured.
    #[error("no token configured")]
    NotConfigured,

    /// Provider-specific failure while producing a token.
    #[error("token provider error: {0}")]
    Provider(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
