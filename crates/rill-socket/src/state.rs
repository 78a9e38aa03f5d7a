//! The session lifecycle state machine.
//!
//! `Disconnected → Connecting → Connected → Reconnecting → Connecting → …`,
//! terminal only on an explicit close. The transition table lives here as a
//! pure function so the reconnect rules are testable without a transport:
//! the session feeds it events and acts on the resulting state.

/// Lifecycle states of a [`crate::Session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No transport. Initial state, and terminal after an explicit close.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Transport established; the receive loop is running.
    Connected,
    /// Transport lost or surrendered; about to re-enter `Connecting`.
    Reconnecting,
}

/// Events that drive lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The owner (or the reconnect path) asked for a connection.
    ConnectRequested,
    /// The transport handshake completed.
    HandshakeSucceeded,
    /// The transport handshake failed.
    HandshakeFailed,
    /// The peer asked us to drop and re-establish the connection.
    PeerReconnectRequested,
    /// No keep-alive reply arrived within the liveness window.
    KeepaliveTimedOut,
    /// The established transport dropped underneath us.
    TransportClosed,
    /// The owner closed the session.
    CloseRequested,
}

/// The transition table. Returns `None` when `event` is not meaningful in
/// `state`; callers treat that as "stay put".
#[must_use]
pub fn transition(state: SessionState, event: SessionEvent) -> Option<SessionState> {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        // close wins from anywhere and is idempotent
        (_, E::CloseRequested) => Some(S::Disconnected),

        (S::Disconnected | S::Reconnecting, E::ConnectRequested) => Some(S::Connecting),
        (S::Connecting, E::HandshakeSucceeded) => Some(S::Connected),
        (S::Connecting, E::HandshakeFailed) => Some(S::Disconnected),

        // post-connect drops re-enter the connect path; initial-connect
        // failures (handled above) do not
        (
            S::Connected,
            E::PeerReconnectRequested | E::KeepaliveTimedOut | E::TransportClosed,
        ) => Some(S::Reconnecting),

        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
