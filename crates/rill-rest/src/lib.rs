//! # rill-rest
//!
//! Rate-limit-aware HTTP request pipeline.
//!
//! Every request goes through one path: attach the bearer credential, time
//! the call, classify the outcome. Server-imposed throttling (429) surfaces
//! as [`RestError::RateLimited`] — a failure callers can distinguish from
//! transport problems and shape mismatches, because the remediation differs
//! for each. Quota telemetry carried on ordinary responses is published to a
//! broadcast channel so interested observers learn about headroom without
//! polling.
//!
//! The pipeline performs no implicit retries: callers observing
//! [`RestError::RateLimited`] decide whether and when to retry, typically
//! honoring the published reset instant.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod limits;

pub use client::{RestClient, RestResponse};
pub use errors::RestError;
pub use limits::RateLimitSnapshot;
