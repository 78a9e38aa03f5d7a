//! Settings loading with layered sources.
//!
//! Loading flow:
//!
//! 1. Start with compiled [`RillSettings::default()`]
//! 2. If the settings file exists, merge its values over the defaults
//! 3. Apply `RILL_`-prefixed environment variable overrides (highest
//!    priority); section and field are separated by `__`, e.g.
//!    `RILL_SOCKET__HEARTBEAT_INTERVAL_MS=5000`

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::RillSettings;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "RILL_";

/// Load settings from environment overrides over compiled defaults, with no
/// settings file.
pub fn load_settings() -> Result<RillSettings> {
    finish(base_figment())
}

/// Load settings from a specific file path with env var overrides.
///
/// A missing file is not an error — the remaining layers still apply. A file
/// that exists but does not parse is surfaced as [`SettingsError::Load`].
pub fn load_settings_from_path(path: &Path) -> Result<RillSettings> {
    let mut figment = base_figment();
    if path.exists() {
        debug!(?path, "loading settings from file");
        figment = figment.merge(Json::file(path));
    } else {
        debug!(?path, "settings file not found, using defaults");
    }
    finish(figment)
}

fn base_figment() -> Figment {
    Figment::from(Serialized::defaults(RillSettings::default()))
}

fn finish(figment: Figment) -> Result<RillSettings> {
    let settings: RillSettings = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    validate(&settings)?;
    Ok(settings)
}

/// Reject values the runtime cannot operate with.
fn validate(settings: &RillSettings) -> Result<()> {
    if settings.socket.heartbeat_interval_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "socket.heartbeat_interval_ms must be positive".to_string(),
        ));
    }
    if settings.socket.heartbeat_timeout_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "socket.heartbeat_timeout_ms must be positive".to_string(),
        ));
    }
    if settings.rest.request_timeout_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "rest.request_timeout_ms must be positive".to_string(),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
