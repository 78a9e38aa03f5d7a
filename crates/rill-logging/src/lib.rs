//! # rill-logging
//!
//! Structured logging setup with `tracing`.
//!
//! The runtime crates emit through the `tracing` macros only; this crate
//! installs the process-wide subscriber. Filtering follows `RUST_LOG`, with
//! `info` as the default level.

#![deny(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, panicking if one is already set.
///
/// Intended for binaries that own the process. Libraries and tests should
/// prefer [`try_init`].
pub fn init() {
    try_init();
    tracing::debug!("logging initialized");
}

/// Install the global fmt subscriber if none is set yet.
///
/// Safe to call more than once; later calls are no-ops. This keeps embedding
/// applications free to install their own subscriber first.
pub fn try_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
