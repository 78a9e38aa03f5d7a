//! # rill-core
//!
//! Wire-level vocabulary for the rill client runtime: the three packet shapes
//! spoken by streaming-platform realtime endpoints, the codecs that map raw
//! frames to and from them, and the shared decode error surface.
//!
//! The three shapes:
//!
//! - **[`ChannelPacket`]**: array-encoded channel-protocol frame
//!   (`[join_ref, message_ref, topic, event, payload]`)
//! - **[`TaggedPacket`]**: IRC-style tagged line
//!   (`[@tags ][:source ]COMMAND [params...][ :trailing]`)
//! - **[`Envelope`]**: JSON envelope with a string `type` discriminator
//!
//! All decoders degrade gracefully: a missing or partially-present *field*
//! falls back to a documented default so servers can add optional fields
//! without breaking older clients. Only a frame that cannot be read at all
//! (invalid JSON where JSON is required, a line with no command token)
//! surfaces as [`DecodeError`].
//!
//! This crate carries no transport or runtime dependencies so it can be
//! reused by tooling and tests without pulling in tokio.

#![deny(unsafe_code)]

pub mod channel;
pub mod envelope;
pub mod errors;
pub mod packet;
pub mod tagged;

pub use channel::ChannelPacket;
pub use envelope::{Envelope, EnvelopeMessage, EnvelopeResponse, TopicKind};
pub use errors::{DecodeError, Result};
pub use packet::Packet;
pub use tagged::TaggedPacket;
