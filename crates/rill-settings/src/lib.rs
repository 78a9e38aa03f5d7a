//! # rill-settings
//!
//! Layered configuration for the rill client runtime.
//!
//! Loading flow, lowest priority first:
//!
//! 1. Compiled [`RillSettings::default()`]
//! 2. An optional JSON settings file
//! 3. `RILL_`-prefixed environment variables (highest priority)
//!
//! Layering is done with `figment`; missing fields at any layer fall through
//! to the layer below.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{load_settings, load_settings_from_path};
pub use types::{ResetEpochUnit, RestSettings, RillSettings, SocketSettings};
