//! Session error types.

use thiserror::Error;

/// Errors that can occur on a persistent-connection session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport handshake or an established connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The transport handshake did not complete in time.
    #[error("connect timed out after {timeout_ms} ms")]
    ConnectTimeout {
        /// Configured handshake timeout.
        timeout_ms: u64,
    },

    /// An operation required the `Connected` state.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called while the session is already active.
    ///
    /// Retrying a *failed* connect is fine — the session lands back in
    /// `Disconnected` first.
    #[error("session is already active")]
    AlreadyActive,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_display() {
        let err = SessionError::ConnectTimeout { timeout_ms: 10_000 };
        assert_eq!(err.to_string(), "connect timed out after 10000 ms");
    }

    #[test]
    fn not_connected_display() {
        assert_eq!(SessionError::NotConnected.to_string(), "not connected");
    }
}
