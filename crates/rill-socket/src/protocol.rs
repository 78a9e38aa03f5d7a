//! Protocol profiles binding a session to one wire shape.
//!
//! The session and dispatcher are shape-agnostic; everything
//! protocol-specific — which codec decodes a frame, what the keep-alive
//! exchange looks like, which packet means "drop and reconnect", and what
//! immediate replies the peer expects — lives behind [`WireProtocol`].

use rill_core::channel::{self, ChannelPacket};
use rill_core::{DecodeError, Envelope, Packet, TaggedPacket};

/// One wire shape's protocol rules.
pub trait WireProtocol: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Decode one inbound frame.
    fn decode(&self, frame: &str) -> Result<Packet, DecodeError>;

    /// The keep-alive frame to send on the heartbeat interval, if this
    /// protocol keeps the connection alive from the client side. Called per
    /// tick — protocols with per-message references return a fresh frame
    /// each time.
    fn keepalive(&self) -> Option<String>;

    /// Whether `packet` answers an outstanding keep-alive.
    fn is_keepalive_reply(&self, packet: &Packet) -> bool;

    /// Whether `packet` is the peer asking us to reconnect.
    fn wants_reconnect(&self, packet: &Packet) -> bool;

    /// An immediate reply the peer expects for `packet`, if any (e.g. the
    /// tagged-line server-initiated ping).
    fn reply_for(&self, packet: &Packet) -> Option<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Array-channel profile
// ─────────────────────────────────────────────────────────────────────────────

/// Profile for the array-encoded channel protocol.
///
/// Keep-alives are client-initiated heartbeat packets on the phoenix topic;
/// the server answers with a reply on the same topic. A channel error event
/// from the peer means the subscription is dead and the connection should be
/// re-established.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelProtocol;

/// Event the peer emits when a channel has crashed.
const CHANNEL_ERROR_EVENT: &str = "phx_error";

impl WireProtocol for ChannelProtocol {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn decode(&self, frame: &str) -> Result<Packet, DecodeError> {
        Ok(ChannelPacket::decode(frame)?.into())
    }

    fn keepalive(&self) -> Option<String> {
        Some(ChannelPacket::heartbeat().encode())
    }

    fn is_keepalive_reply(&self, packet: &Packet) -> bool {
        matches!(
            packet,
            Packet::Channel(p) if p.topic == channel::PHOENIX_TOPIC && p.is_reply()
        )
    }

    fn wants_reconnect(&self, packet: &Packet) -> bool {
        matches!(
            packet,
            Packet::Channel(p) if p.event.eq_ignore_ascii_case(CHANNEL_ERROR_EVENT)
        )
    }

    fn reply_for(&self, _packet: &Packet) -> Option<String> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tagged-line profile
// ─────────────────────────────────────────────────────────────────────────────

/// Profile for the IRC-style tagged-line protocol.
///
/// Liveness runs both ways: the client pings on the heartbeat interval and
/// expects a `PONG`, and the server pings too — those must be answered
/// immediately, echoing the server's parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaggedProtocol;

impl WireProtocol for TaggedProtocol {
    fn name(&self) -> &'static str {
        "tagged"
    }

    fn decode(&self, frame: &str) -> Result<Packet, DecodeError> {
        Ok(TaggedPacket::decode(frame)?.into())
    }

    fn keepalive(&self) -> Option<String> {
        Some(TaggedPacket::new("PING", Vec::new()).encode())
    }

    fn is_keepalive_reply(&self, packet: &Packet) -> bool {
        matches!(packet, Packet::Tagged(p) if p.command == "PONG")
    }

    fn wants_reconnect(&self, packet: &Packet) -> bool {
        matches!(packet, Packet::Tagged(p) if p.command == "RECONNECT")
    }

    fn reply_for(&self, packet: &Packet) -> Option<String> {
        let Packet::Tagged(p) = packet else {
            return None;
        };
        if p.command != "PING" {
            return None;
        }
        let reply = if p.params.is_empty() {
            TaggedPacket::new("PONG", Vec::new())
        } else {
            TaggedPacket::with_trailing("PONG", Vec::new(), p.param(0))
        };
        Some(reply.encode())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope profile
// ─────────────────────────────────────────────────────────────────────────────

/// Profile for the JSON envelope protocol.
///
/// Keep-alives are client-initiated `PING` envelopes answered by `PONG`; a
/// `RECONNECT` envelope is the peer requesting that we re-establish the
/// connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeProtocol;

impl WireProtocol for EnvelopeProtocol {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn decode(&self, frame: &str) -> Result<Packet, DecodeError> {
        Ok(Envelope::decode(frame)?.into())
    }

    fn keepalive(&self) -> Option<String> {
        Some(Envelope::ping())
    }

    fn is_keepalive_reply(&self, packet: &Packet) -> bool {
        matches!(packet, Packet::Envelope(Envelope::Pong))
    }

    fn wants_reconnect(&self, packet: &Packet) -> bool {
        matches!(packet, Packet::Envelope(Envelope::Reconnect))
    }

    fn reply_for(&self, _packet: &Packet) -> Option<String> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
