//! Settings type definitions.
//!
//! Each type implements [`Default`] with production default values and is
//! marked `#[serde(default)]` so partial JSON is accepted — missing fields
//! fall back to their defaults during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings type for the rill runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RillSettings {
    /// Persistent-connection session settings.
    pub socket: SocketSettings,
    /// REST pipeline settings.
    pub rest: RestSettings,
}

/// Settings for a persistent-connection session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketSettings {
    /// Transport handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Interval between keep-alive sends in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// How long to wait for a keep-alive reply before treating the
    /// connection as dead, in milliseconds.
    pub heartbeat_timeout_ms: u64,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            heartbeat_interval_ms: 60_000,
            heartbeat_timeout_ms: 10_000,
        }
    }
}

/// Settings for the REST pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestSettings {
    /// Base URL requests are issued against.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Epoch unit of the rate-limit reset header, per platform convention.
    pub reset_epoch_unit: ResetEpochUnit,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_ms: 5_000,
            reset_epoch_unit: ResetEpochUnit::Milliseconds,
        }
    }
}

/// Epoch unit used by a platform's rate-limit reset header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResetEpochUnit {
    /// Reset header counts seconds since the Unix epoch.
    Seconds,
    /// Reset header counts milliseconds since the Unix epoch.
    #[default]
    Milliseconds,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
