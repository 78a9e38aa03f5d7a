//! JSON envelope packets with a string `type` discriminator.
//!
//! The envelope protocol is the simplest of the three shapes on the outside —
//! `{"type": "...", ...}` — but the payload-bearing `MESSAGE` kind nests a
//! second discriminator: `data.topic` selects which concrete event schema the
//! inner message carries.
//!
//! Unknown discriminators at either level decode successfully as
//! [`Envelope::Unrecognized`] / [`TopicKind::Unknown`] carrying the raw
//! structured payload. Servers add message kinds without notice; failing on
//! them would be a compatibility bug.

use serde_json::{Value, json};

use crate::errors::{DecodeError, Result};

/// Discriminator for reply packets.
pub const RESPONSE_KIND: &str = "RESPONSE";
/// Discriminator for payload-bearing packets.
pub const MESSAGE_KIND: &str = "MESSAGE";
/// Discriminator for keep-alive replies.
pub const PONG_KIND: &str = "PONG";
/// Discriminator for peer-requested reconnects.
pub const RECONNECT_KIND: &str = "RECONNECT";

/// One decoded envelope message.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// Reply to a prior send, correlated by nonce.
    Response(EnvelopeResponse),
    /// Payload-bearing message; the topic selects the inner schema.
    Message(EnvelopeMessage),
    /// Keep-alive reply.
    Pong,
    /// Peer requests that the client drop and re-establish the connection.
    Reconnect,
    /// Any discriminator this client does not know, kept whole.
    Unrecognized {
        /// The unrecognized `type` value.
        kind: String,
        /// The entire envelope as received.
        payload: Value,
    },
}

/// Body of a [`Envelope::Response`] packet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvelopeResponse {
    /// Echo of the nonce sent with the originating request.
    pub nonce: String,
    /// Error description; empty on success.
    pub error: String,
}

impl EnvelopeResponse {
    /// Whether the originating request succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

/// Body of a [`Envelope::Message`] packet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvelopeMessage {
    /// Full topic string, e.g. `channel-bits-events-v1.44322889`.
    pub topic: String,
    /// Inner message exactly as received; conventionally a JSON document
    /// encoded as a string.
    pub message: String,
}

impl EnvelopeMessage {
    /// The topic family this message belongs to, derived from the topic
    /// prefix (the part before the first `.`).
    #[must_use]
    pub fn topic_kind(&self) -> TopicKind {
        TopicKind::from_topic(&self.topic)
    }

    /// Best-effort parse of the inner message as JSON. `None` when the inner
    /// text is not a JSON document.
    #[must_use]
    pub fn message_value(&self) -> Option<Value> {
        serde_json::from_str(&self.message).ok()
    }
}

/// Topic families carried by `MESSAGE` packets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopicKind {
    /// Direct whispers to the authenticated user.
    Whispers,
    /// Bits events, v1 schema.
    BitsV1,
    /// Bits events, v2 schema.
    BitsV2,
    /// Bits badge unlock events.
    BitsBadge,
    /// Subscription and resubscription events.
    Subscriptions,
    /// Channel points redemption events.
    ChannelPoints,
    /// A topic family this client does not know.
    Unknown,
}

impl TopicKind {
    /// Derive the topic family from a full topic string.
    #[must_use]
    pub fn from_topic(topic: &str) -> Self {
        let prefix = topic.split('.').next().unwrap_or(topic);
        match prefix {
            "whispers" => Self::Whispers,
            "channel-bits-events-v1" => Self::BitsV1,
            "channel-bits-events-v2" => Self::BitsV2,
            "channel-bits-badge-unlocks" => Self::BitsBadge,
            "channel-subscribe-events-v1" => Self::Subscriptions,
            "community-points-channel-v1" => Self::ChannelPoints,
            _ => Self::Unknown,
        }
    }

    /// Stable key used for fine-grained dispatch.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whispers => "whispers",
            Self::BitsV1 => "channel-bits-events-v1",
            Self::BitsV2 => "channel-bits-events-v2",
            Self::BitsBadge => "channel-bits-badge-unlocks",
            Self::Subscriptions => "channel-subscribe-events-v1",
            Self::ChannelPoints => "community-points-channel-v1",
            Self::Unknown => "unknown",
        }
    }
}

impl Envelope {
    /// Decode a frame holding a JSON envelope object.
    ///
    /// The frame must be a JSON object with a string `type` field; everything
    /// else about it is optional and degrades to defaults.
    pub fn decode(frame: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(frame)?;
        let Value::Object(ref object) = value else {
            return Err(DecodeError::Shape { expected: "object" });
        };
        let Some(kind) = object.get("type").and_then(Value::as_str) else {
            return Err(DecodeError::MissingType);
        };

        Ok(match kind {
            PONG_KIND => Self::Pong,
            RECONNECT_KIND => Self::Reconnect,
            RESPONSE_KIND => Self::Response(EnvelopeResponse {
                nonce: field_string(object.get("nonce")),
                error: field_string(object.get("error")),
            }),
            MESSAGE_KIND => {
                let data = object.get("data");
                Self::Message(EnvelopeMessage {
                    topic: field_string(data.and_then(|d| d.get("topic"))),
                    message: field_string(data.and_then(|d| d.get("message"))),
                })
            }
            other => Self::Unrecognized {
                kind: other.to_string(),
                payload: value.clone(),
            },
        })
    }

    /// The discriminator this envelope was classified under.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Response(_) => RESPONSE_KIND,
            Self::Message(_) => MESSAGE_KIND,
            Self::Pong => PONG_KIND,
            Self::Reconnect => RECONNECT_KIND,
            Self::Unrecognized { kind, .. } => kind,
        }
    }

    /// Encode the keep-alive request frame.
    #[must_use]
    pub fn ping() -> String {
        json!({"type": "PING"}).to_string()
    }

    /// Encode a listen request subscribing to `topics`, authenticated by
    /// `auth_token` and correlated by `nonce`.
    #[must_use]
    pub fn listen(topics: &[String], auth_token: &str, nonce: &str) -> String {
        json!({
            "type": "LISTEN",
            "nonce": nonce,
            "data": {
                "topics": topics,
                "auth_token": auth_token,
            },
        })
        .to_string()
    }
}

/// Read an optional field as a string, degrading absent or non-string values
/// to `""`.
fn field_string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map_or_else(String::new, ToString::to_string)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
