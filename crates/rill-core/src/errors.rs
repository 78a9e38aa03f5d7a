//! Decode error surface shared by all three wire codecs.
//!
//! [`DecodeError`] means a frame could not be read at all. Partial frames are
//! *not* errors: absent fields degrade to their documented defaults so that
//! servers remain free to add optional fields. The dispatcher logs and drops
//! undecodable frames without touching the connection.

use thiserror::Error;

/// Errors produced while decoding a raw frame into a typed packet.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame was not valid JSON where JSON is required.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON frame had the wrong top-level shape.
    #[error("frame is not a json {expected}")]
    Shape {
        /// The top-level JSON kind the codec requires.
        expected: &'static str,
    },

    /// An array position held a JSON kind the protocol forbids there.
    #[error("position {position} must be a json object")]
    Position {
        /// Zero-based array position.
        position: usize,
    },

    /// Tagged line had no command token.
    #[error("tagged line is missing its command token")]
    MissingCommand,

    /// Envelope had no string `type` discriminator.
    #[error("envelope is missing its string `type` field")]
    MissingType,
}

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, DecodeError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
