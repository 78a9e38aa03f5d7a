//! Array-encoded channel-protocol packets.
//!
//! Wire format is a JSON array of exactly five logical positions:
//!
//! ```json
//! ["1", "b9116b72-…", "__absinthe__:control", "phx_reply", {"status": "ok"}]
//! ```
//!
//! Positions are `[join_ref, message_ref, topic, event, payload]`. When
//! decoding, any prefix length 0–5 is accepted; absent trailing positions
//! keep their pre-decode defaults. When encoding, all five positions are
//! always emitted (the payload encodes as `{}` when empty, never omitted).

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::errors::{DecodeError, Result};

/// Control topic used for most request packets.
pub const CONTROL_TOPIC: &str = "__absinthe__:control";

/// Event sent when subscribing to a document query.
pub const DOC_EVENT: &str = "doc";

/// Reply event received for most response packets.
pub const REPLY_EVENT: &str = "phx_reply";

/// Keep-alive event name.
pub const HEARTBEAT_EVENT: &str = "heartbeat";

/// Topic keep-alive packets are addressed to.
pub const PHOENIX_TOPIC: &str = "phoenix";

/// One decoded channel-protocol message.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelPacket {
    /// Join reference for multi-connection bookkeeping.
    pub join_ref: String,
    /// Per-message reference, echoed back on replies.
    pub message_ref: String,
    /// Topic the packet addresses.
    pub topic: String,
    /// Event that occurred.
    pub event: String,
    /// Structured payload; empty object when the server sent none.
    pub payload: Map<String, Value>,
}

impl Default for ChannelPacket {
    fn default() -> Self {
        Self {
            join_ref: "1".to_string(),
            message_ref: Uuid::new_v4().to_string(),
            topic: String::new(),
            event: String::new(),
            payload: Map::new(),
        }
    }
}

impl ChannelPacket {
    /// Build a packet addressed to `topic` carrying `event` and `payload`.
    ///
    /// References take their construction defaults: `join_ref` is the fixed
    /// literal `"1"`, `message_ref` a freshly generated unique token.
    #[must_use]
    pub fn new(topic: impl Into<String>, event: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            ..Self::default()
        }
    }

    /// Build the keep-alive packet.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(PHOENIX_TOPIC, HEARTBEAT_EVENT, Map::new())
    }

    /// Decode a frame holding a JSON array of 0–5 positions.
    ///
    /// Positions 0–3 are stringified scalars; a JSON `null` leaves the
    /// field's default in place. Position 4, when present and non-null, must
    /// be a JSON object.
    pub fn decode(frame: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(frame)?;
        let Value::Array(items) = value else {
            return Err(DecodeError::Shape { expected: "array" });
        };

        let mut packet = Self::default();
        if let Some(s) = items.first().and_then(position_string) {
            packet.join_ref = s;
        }
        if let Some(s) = items.get(1).and_then(position_string) {
            packet.message_ref = s;
        }
        if let Some(s) = items.get(2).and_then(position_string) {
            packet.topic = s;
        }
        if let Some(s) = items.get(3).and_then(position_string) {
            packet.event = s;
        }
        match items.get(4) {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => packet.payload = map.clone(),
            Some(_) => return Err(DecodeError::Position { position: 4 }),
        }
        Ok(packet)
    }

    /// Encode as the full five-element array, in fixed order.
    #[must_use]
    pub fn encode(&self) -> String {
        json!([
            self.join_ref,
            self.message_ref,
            self.topic,
            self.event,
            Value::Object(self.payload.clone()),
        ])
        .to_string()
    }

    /// Whether this packet is a reply to a prior send.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.event.eq_ignore_ascii_case(REPLY_EVENT)
    }

    /// Whether the payload carries a `status` field equal to `"ok"`
    /// (case-insensitive).
    #[must_use]
    pub fn is_status_ok(&self) -> bool {
        self.payload
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case("ok"))
    }
}

/// Stringify a scalar array position. `null` yields `None` so the field keeps
/// its default; non-string scalars keep their JSON rendering.
fn position_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decode_full_array() {
        let packet =
            ChannelPacket::decode(r#"["7","ref-1","chat:42","msg",{"body":"hi"}]"#).unwrap();
        assert_eq!(packet.join_ref, "7");
        assert_eq!(packet.message_ref, "ref-1");
        assert_eq!(packet.topic, "chat:42");
        assert_eq!(packet.event, "msg");
        assert_eq!(packet.payload.get("body").unwrap(), "hi");
    }

    #[test]
    fn decode_short_array_keeps_defaults() {
        let packet = ChannelPacket::decode(r#"["3","r"]"#).unwrap();
        assert_eq!(packet.join_ref, "3");
        assert_eq!(packet.message_ref, "r");
        assert_eq!(packet.topic, "");
        assert_eq!(packet.event, "");
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn decode_empty_array_is_all_defaults() {
        let packet = ChannelPacket::decode("[]").unwrap();
        assert_eq!(packet.join_ref, "1");
        assert!(!packet.message_ref.is_empty());
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn decode_null_positions_keep_defaults() {
        let packet = ChannelPacket::decode(r#"[null,null,"t","e",null]"#).unwrap();
        assert_eq!(packet.join_ref, "1");
        assert_eq!(packet.topic, "t");
        assert_eq!(packet.event, "e");
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn decode_numeric_refs_are_stringified() {
        let packet = ChannelPacket::decode(r#"[1,2,"t","e"]"#).unwrap();
        assert_eq!(packet.join_ref, "1");
        assert_eq!(packet.message_ref, "2");
    }

    #[test]
    fn decode_non_object_payload_is_malformed() {
        let err = ChannelPacket::decode(r#"["1","2","t","e","oops"]"#).unwrap_err();
        assert_matches!(err, DecodeError::Position { position: 4 });
    }

    #[test]
    fn decode_non_array_is_malformed() {
        let err = ChannelPacket::decode(r#"{"event":"msg"}"#).unwrap_err();
        assert_matches!(err, DecodeError::Shape { expected: "array" });
    }

    #[test]
    fn decode_invalid_json_is_malformed() {
        assert_matches!(ChannelPacket::decode("not json"), Err(DecodeError::Json(_)));
    }

    #[test]
    fn encode_always_emits_five_positions() {
        let packet = ChannelPacket::new("chat:42", "msg", Map::new());
        let value: Value = serde_json::from_str(&packet.encode()).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[4], json!({}));
    }

    #[test]
    fn decode_then_encode_round_trips_present_positions() {
        let frame = r#"["5","abc","room:1","shout",{"text":"hey"}]"#;
        let packet = ChannelPacket::decode(frame).unwrap();
        let encoded = packet.encode();
        let reparsed = ChannelPacket::decode(&encoded).unwrap();
        assert_eq!(packet, reparsed);
    }

    #[test]
    fn reply_detection_is_case_insensitive() {
        let packet = ChannelPacket::decode(r#"["1","2","t","PHX_REPLY"]"#).unwrap();
        assert!(packet.is_reply());
    }

    #[test]
    fn status_ok_is_case_insensitive() {
        let packet = ChannelPacket::decode(r#"["1","2","t","phx_reply",{"status":"OK"}]"#).unwrap();
        assert!(packet.is_status_ok());
    }

    #[test]
    fn status_missing_is_not_ok() {
        let packet = ChannelPacket::decode(r#"["1","2","t","phx_reply",{}]"#).unwrap();
        assert!(!packet.is_status_ok());
    }

    #[test]
    fn heartbeat_addresses_the_phoenix_topic() {
        let packet = ChannelPacket::heartbeat();
        assert_eq!(packet.topic, PHOENIX_TOPIC);
        assert_eq!(packet.event, HEARTBEAT_EVENT);
        assert_eq!(packet.join_ref, "1");
    }

    #[test]
    fn fresh_packets_get_unique_message_refs() {
        let a = ChannelPacket::heartbeat();
        let b = ChannelPacket::heartbeat();
        assert_ne!(a.message_ref, b.message_ref);
    }
}
