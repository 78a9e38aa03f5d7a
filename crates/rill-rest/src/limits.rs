//! Quota header extraction.
//!
//! Platforms report per-bucket quota on ordinary responses through three
//! headers: an allowed count, a remaining count, and a reset value (integer
//! epoch, in seconds or milliseconds depending on the platform's
//! convention). A snapshot is derived fresh from each response that carries
//! the allowed header; it fully replaces whatever observers held before —
//! nothing is accumulated across calls.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use rill_settings::ResetEpochUnit;

/// Header carrying the total number of calls allowed in the bucket.
pub const ALLOWED_HEADER: &str = "x-rate-limit";
/// Header carrying the number of calls remaining before throttling.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the epoch instant the bucket resets at.
pub const RESET_HEADER: &str = "x-ratelimit-reset";
/// Header naming the bucket the quota applies to.
pub const BUCKET_HEADER: &str = "x-ratelimit-bucket";

/// Bucket name used when the platform does not name one.
pub const DEFAULT_BUCKET: &str = "global";

/// One immutable quota observation, derived from a single response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Total calls allowed against this bucket.
    pub allowed: u32,
    /// Calls remaining before requests will be throttled.
    pub remaining: u32,
    /// Absolute instant the bucket resets at.
    pub resets_at: DateTime<Utc>,
    /// The bucket this snapshot describes.
    pub bucket: String,
}

impl RateLimitSnapshot {
    /// Extract a snapshot from response headers.
    ///
    /// Returns `None` unless the allowed header is present. Individual
    /// fields that are present but unparseable degrade to zero / the epoch
    /// rather than discarding the snapshot.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, unit: ResetEpochUnit) -> Option<Self> {
        let _ = headers.get(ALLOWED_HEADER)?;
        Some(Self {
            allowed: header_number(headers, ALLOWED_HEADER),
            remaining: header_number(headers, REMAINING_HEADER),
            resets_at: reset_instant(header_i64(headers, RESET_HEADER), unit),
            bucket: bucket_name(headers),
        })
    }
}

/// The bucket named by the response, or [`DEFAULT_BUCKET`].
#[must_use]
pub fn bucket_name(headers: &HeaderMap) -> String {
    headers
        .get(BUCKET_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BUCKET)
        .to_string()
}

/// Convert a reset epoch value to an absolute instant, per the platform's
/// epoch unit. Absent or unparseable values read as the epoch itself.
fn reset_instant(value: Option<i64>, unit: ResetEpochUnit) -> DateTime<Utc> {
    let value = value.unwrap_or(0);
    let parsed = match unit {
        ResetEpochUnit::Seconds => DateTime::from_timestamp(value, 0),
        ResetEpochUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    parsed.unwrap_or(DateTime::UNIX_EPOCH)
}

fn header_number(headers: &HeaderMap, name: &str) -> u32 {
    header_i64(headers, name)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderName, HeaderValue};

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            let _ = map.insert(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn full_header_set_in_milliseconds() {
        let map = headers(&[
            (ALLOWED_HEADER, "1000"),
            (REMAINING_HEADER, "998"),
            (RESET_HEADER, "1700000000000"),
            (BUCKET_HEADER, "channels"),
        ]);
        let snapshot =
            RateLimitSnapshot::from_headers(&map, ResetEpochUnit::Milliseconds).unwrap();
        assert_eq!(snapshot.allowed, 1000);
        assert_eq!(snapshot.remaining, 998);
        assert_eq!(
            snapshot.resets_at,
            DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
        );
        assert_eq!(snapshot.bucket, "channels");
    }

    #[test]
    fn reset_in_seconds_converts_consistently() {
        let map = headers(&[(ALLOWED_HEADER, "10"), (RESET_HEADER, "1700000000")]);
        let snapshot = RateLimitSnapshot::from_headers(&map, ResetEpochUnit::Seconds).unwrap();
        assert_eq!(
            snapshot.resets_at,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn no_allowed_header_means_no_snapshot() {
        let map = headers(&[(REMAINING_HEADER, "5")]);
        assert!(RateLimitSnapshot::from_headers(&map, ResetEpochUnit::Milliseconds).is_none());
    }

    #[test]
    fn unparseable_fields_degrade_to_defaults() {
        let map = headers(&[
            (ALLOWED_HEADER, "soon"),
            (REMAINING_HEADER, "many"),
            (RESET_HEADER, "tomorrow"),
        ]);
        let snapshot =
            RateLimitSnapshot::from_headers(&map, ResetEpochUnit::Milliseconds).unwrap();
        assert_eq!(snapshot.allowed, 0);
        assert_eq!(snapshot.remaining, 0);
        assert_eq!(snapshot.resets_at, DateTime::UNIX_EPOCH);
        assert_eq!(snapshot.bucket, DEFAULT_BUCKET);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        // HeaderMap normalizes names to lowercase on insert; a server sending
        // mixed case arrives the same way.
        let map = headers(&[("X-Rate-Limit", "42")]);
        let snapshot =
            RateLimitSnapshot::from_headers(&map, ResetEpochUnit::Milliseconds).unwrap();
        assert_eq!(snapshot.allowed, 42);
    }
}
