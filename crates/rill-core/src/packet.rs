//! The packet sum type the dispatcher classifies on.
//!
//! A [`Packet`] is one decoded protocol message in any of the three wire
//! shapes. Classification is uniform: every packet exposes a coarse
//! discriminator, and payload-bearing envelope messages additionally expose a
//! fine (second-level) discriminator so subscribers can observe either
//! granularity.

use crate::channel::ChannelPacket;
use crate::envelope::Envelope;
use crate::tagged::TaggedPacket;

/// One decoded protocol message.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    /// Array-encoded channel-protocol frame.
    Channel(ChannelPacket),
    /// IRC-style tagged line.
    Tagged(TaggedPacket),
    /// JSON envelope with a `type` discriminator.
    Envelope(Envelope),
}

impl Packet {
    /// The coarse classification key: the channel `event`, the tagged-line
    /// command, or the envelope `type`.
    #[must_use]
    pub fn discriminator(&self) -> &str {
        match self {
            Self::Channel(packet) => &packet.event,
            Self::Tagged(packet) => &packet.command,
            Self::Envelope(envelope) => envelope.kind(),
        }
    }

    /// The fine classification key, when the shape has one. Envelope
    /// `MESSAGE` packets refine by topic family; the other shapes do not
    /// refine further.
    #[must_use]
    pub fn sub_discriminator(&self) -> Option<&'static str> {
        match self {
            Self::Envelope(Envelope::Message(message)) => Some(message.topic_kind().as_str()),
            _ => None,
        }
    }
}

impl From<ChannelPacket> for Packet {
    fn from(packet: ChannelPacket) -> Self {
        Self::Channel(packet)
    }
}

impl From<TaggedPacket> for Packet {
    fn from(packet: TaggedPacket) -> Self {
        Self::Tagged(packet)
    }
}

impl From<Envelope> for Packet {
    fn from(envelope: Envelope) -> Self {
        Self::Envelope(envelope)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
