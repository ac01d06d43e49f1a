//! Human-scale age rendering (`42s`, `5m`, `3h`, `12d`).

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Render `elapsed` in the coarsest unit that keeps the number human-scale.
/// Values are truncated, never rounded.
pub fn format_age(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

/// Age of an object created at `created`, measured at `now`.
///
/// Unknown creation time renders as `-`; timestamps in the future (clock skew) as `0s`.
pub fn age_since(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else { return "-".to_string() };
    let elapsed = (now - created).to_std().unwrap_or_default();
    format_age(elapsed)
}

/// Parse an RFC 3339 timestamp such as `metadata.creationTimestamp`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
}
