//! IRC-style tagged-line packets.
//!
//! Wire format, one frame per transport message:
//!
//! ```text
//! [@tag1=val1;tag2=val2 ][:source ]COMMAND [params...][ :trailing]
//! ```
//!
//! A parameter beginning with `:` consumes the remainder of the line verbatim
//! as the trailing parameter, embedded spaces included. Detection is by the
//! leading `:`, not by token position.
//!
//! Tag lookups never return null: absent tags degrade to `false` / `0` / `""`
//! through the typed accessors. Callers that must distinguish "tag absent"
//! from "tag present but empty" (list-valued tags) use [`TaggedPacket::has_tag`].

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::errors::{DecodeError, Result};

/// One decoded tagged-line message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaggedPacket {
    /// Command identifier, e.g. `PRIVMSG`.
    pub command: String,
    /// Tag name → value. Keys are case-sensitive; a tag written without `=`
    /// carries the empty string.
    pub tags: HashMap<String, String>,
    /// Ordered parameters; the trailing parameter, if any, is last.
    pub params: Vec<String>,
    /// Source identity (`nick!user@host`) when present.
    pub source: Option<String>,
    /// Whether the last parameter was written in trailing (`:`) form.
    pub trailing: bool,
}

impl TaggedPacket {
    /// Build a packet for sending.
    #[must_use]
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            command: command.into(),
            params,
            ..Self::default()
        }
    }

    /// Build a packet whose final parameter is sent in trailing form.
    #[must_use]
    pub fn with_trailing(
        command: impl Into<String>,
        mut params: Vec<String>,
        trailing: impl Into<String>,
    ) -> Self {
        params.push(trailing.into());
        Self {
            command: command.into(),
            params,
            trailing: true,
            ..Self::default()
        }
    }

    /// Decode one line. Fails only when no command token is present.
    pub fn decode(line: &str) -> Result<Self> {
        let mut packet = Self::default();
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if let Some(after) = rest.strip_prefix('@') {
            let (tag_part, remainder) = after.split_once(' ').ok_or(DecodeError::MissingCommand)?;
            for pair in tag_part.split(';').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                let _ = packet.tags.insert(key.to_string(), value.to_string());
            }
            rest = remainder;
        }

        rest = rest.trim_start_matches(' ');
        if let Some(after) = rest.strip_prefix(':') {
            let (source, remainder) = after.split_once(' ').ok_or(DecodeError::MissingCommand)?;
            packet.source = Some(source.to_string());
            rest = remainder;
        }

        let mut remaining = rest.trim_start_matches(' ');
        while !remaining.is_empty() {
            if packet.command.is_empty() {
                let (token, tail) = match remaining.split_once(' ') {
                    Some((token, tail)) => (token, tail),
                    None => (remaining, ""),
                };
                packet.command = token.to_string();
                remaining = tail.trim_start_matches(' ');
                continue;
            }
            if let Some(trailing) = remaining.strip_prefix(':') {
                packet.params.push(trailing.to_string());
                packet.trailing = true;
                break;
            }
            let (token, tail) = match remaining.split_once(' ') {
                Some((token, tail)) => (token, tail),
                None => (remaining, ""),
            };
            packet.params.push(token.to_string());
            remaining = tail.trim_start_matches(' ');
        }

        if packet.command.is_empty() {
            return Err(DecodeError::MissingCommand);
        }
        Ok(packet)
    }

    /// Encode back into line form.
    ///
    /// The final parameter is emitted with a leading `:` when the packet was
    /// built in trailing form, or when it contains a space or is empty (it
    /// could not otherwise survive a decode).
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if !self.tags.is_empty() {
            let mut names: Vec<&String> = self.tags.keys().collect();
            names.sort();
            out.push('@');
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                let value = &self.tags[*name];
                if value.is_empty() {
                    out.push_str(name);
                } else {
                    let _ = write!(out, "{name}={value}");
                }
            }
            out.push(' ');
        }
        if let Some(source) = &self.source {
            let _ = write!(out, ":{source} ");
        }
        out.push_str(&self.command);
        for (i, param) in self.params.iter().enumerate() {
            let last = i + 1 == self.params.len();
            if last && (self.trailing || param.contains(' ') || param.is_empty()) {
                let _ = write!(out, " :{param}");
            } else {
                let _ = write!(out, " {param}");
            }
        }
        out
    }

    /// Whether the tag is present at all, regardless of value.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// String tag value; absent tags read as `""`.
    #[must_use]
    pub fn tag_str(&self, name: &str) -> &str {
        self.tags.get(name).map_or("", String::as_str)
    }

    /// Boolean tag value; `"1"` reads as true, anything else (including an
    /// absent tag) as false.
    #[must_use]
    pub fn tag_bool(&self, name: &str) -> bool {
        self.tag_str(name) == "1"
    }

    /// Integer tag value; absence or a parse failure reads as 0.
    #[must_use]
    pub fn tag_int(&self, name: &str) -> i64 {
        self.tag_str(name).parse().unwrap_or(0)
    }

    /// Parameter at `index`; absent positions read as `""`.
    #[must_use]
    pub fn param(&self, index: usize) -> &str {
        self.params.get(index).map_or("", String::as_str)
    }

    /// The space-joined parameter text after skipping the first `skip`
    /// parameters. Used by views whose message body follows addressing
    /// parameters.
    #[must_use]
    pub fn text_after(&self, skip: usize) -> String {
        self.params
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
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
    fn decode_fully_loaded_line() {
        let packet =
            TaggedPacket::decode("@mod=1;slow=5 :nick!user@host PRIVMSG #chan :hello world")
                .unwrap();
        assert!(packet.tag_bool("mod"));
        assert_eq!(packet.tag_int("slow"), 5);
        assert_eq!(packet.source.as_deref(), Some("nick!user@host"));
        assert_eq!(packet.command, "PRIVMSG");
        assert_eq!(packet.params, vec!["#chan", "hello world"]);
    }

    #[test]
    fn trailing_parameter_preserves_internal_spaces() {
        let packet = TaggedPacket::decode("NOTICE #chan :slow mode is  on").unwrap();
        assert_eq!(packet.param(1), "slow mode is  on");
    }

    #[test]
    fn trailing_detection_is_by_leading_colon_not_position() {
        let packet = TaggedPacket::decode("CAP * ACK :message-tags account-notify").unwrap();
        assert_eq!(
            packet.params,
            vec!["*", "ACK", "message-tags account-notify"]
        );
    }

    #[test]
    fn absent_tags_read_as_defaults() {
        let packet = TaggedPacket::decode("PING :tmi.example.com").unwrap();
        assert!(!packet.tag_bool("mod"));
        assert_eq!(packet.tag_int("slow"), 0);
        assert_eq!(packet.tag_str("emotes"), "");
        assert!(!packet.has_tag("emotes"));
    }

    #[test]
    fn empty_tag_value_is_present_but_empty() {
        let packet = TaggedPacket::decode("@emote-sets=;mod=0 JOIN #chan").unwrap();
        assert!(packet.has_tag("emote-sets"));
        assert_eq!(packet.tag_str("emote-sets"), "");
    }

    #[test]
    fn tag_without_equals_is_present_but_empty() {
        let packet = TaggedPacket::decode("@solo JOIN #chan").unwrap();
        assert!(packet.has_tag("solo"));
        assert_eq!(packet.tag_str("solo"), "");
    }

    #[test]
    fn unparseable_int_tag_reads_zero() {
        let packet = TaggedPacket::decode("@slow=soon ROOMSTATE #chan").unwrap();
        assert_eq!(packet.tag_int("slow"), 0);
    }

    #[test]
    fn command_only_line() {
        let packet = TaggedPacket::decode("RECONNECT").unwrap();
        assert_eq!(packet.command, "RECONNECT");
        assert!(packet.params.is_empty());
        assert!(packet.source.is_none());
    }

    #[test]
    fn missing_command_is_malformed() {
        assert_matches!(TaggedPacket::decode(""), Err(DecodeError::MissingCommand));
        assert_matches!(TaggedPacket::decode("@tag=1"), Err(DecodeError::MissingCommand));
        assert_matches!(TaggedPacket::decode(":source.only"), Err(DecodeError::MissingCommand));
    }

    #[test]
    fn crlf_is_stripped() {
        let packet = TaggedPacket::decode("PING :tmi.example.com\r\n").unwrap();
        assert_eq!(packet.command, "PING");
        assert_eq!(packet.param(0), "tmi.example.com");
    }

    #[test]
    fn encode_round_trips() {
        let line = "@mod=1;slow=5 :nick!user@host PRIVMSG #chan :hello world";
        let packet = TaggedPacket::decode(line).unwrap();
        let reparsed = TaggedPacket::decode(&packet.encode()).unwrap();
        assert_eq!(packet, reparsed);
    }

    #[test]
    fn encode_trailing_form() {
        let packet = TaggedPacket::with_trailing("PRIVMSG", vec!["#chan".into()], "hey there");
        assert_eq!(packet.encode(), "PRIVMSG #chan :hey there");
    }

    #[test]
    fn encode_plain_params() {
        let packet = TaggedPacket::new("JOIN", vec!["#chan".into()]);
        assert_eq!(packet.encode(), "JOIN #chan");
    }

    #[test]
    fn text_after_skips_addressing_params() {
        let packet = TaggedPacket::decode("WHISPER target :psst over here").unwrap();
        assert_eq!(packet.text_after(1), "psst over here");
    }

    #[test]
    fn param_out_of_range_reads_empty() {
        let packet = TaggedPacket::decode("JOIN #chan").unwrap();
        assert_eq!(packet.param(5), "");
    }
}
