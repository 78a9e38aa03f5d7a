//! # rill-socket
//!
//! The persistent-connection half of the rill client runtime: one
//! [`Session`] per transport connection, a [`Dispatcher`] that turns inbound
//! frames into typed packets and fans them out, and a [`SubscriberRegistry`]
//! where calling code registers interest by packet kind.
//!
//! Data flow: raw frames arrive on the session's receive loop → the wire
//! codec decodes → the dispatcher classifies by discriminator → registered
//! callbacks run in registration order. A bad frame is logged and dropped; a
//! faulting callback is logged and skipped; neither touches the connection.
//!
//! Lifecycle is an explicit state machine ([`state`]) so the reconnect rules
//! are testable without a transport. Which of the three wire shapes a
//! session speaks — and what its keep-alive and reconnect signals look like —
//! is a [`WireProtocol`] profile.

#![deny(unsafe_code)]

pub mod dispatch;
pub mod errors;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod state;

pub use dispatch::{Dispatch, Dispatcher};
pub use errors::SessionError;
pub use protocol::{ChannelProtocol, EnvelopeProtocol, TaggedProtocol, WireProtocol};
pub use registry::{Handler, HandlerResult, SubscriberRegistry, SubscriptionId};
pub use session::Session;
pub use state::{SessionEvent, SessionState};
