//! Timestamp handling for departure feeds.
//!
//! Both feeds carry instants as ISO-8601 strings with an explicit offset or
//! a `Z` marker. They are parsed once at the feed boundary and kept as
//! `DateTime<Utc>` everywhere else, so ordering never has to deal with
//! unparsable values.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Error returned when a timestamp string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {value:?}: {reason}")]
pub struct TimestampError {
    value: String,
    reason: String,
}

impl TimestampError {
    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Why the input was rejected.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Parse an RFC 3339 timestamp and normalise it to UTC.
///
/// # Examples
///
/// ```
/// use kiosk_server::domain::parse_timestamp;
///
/// let a = parse_timestamp("2026-10-19T10:02:00.000Z").unwrap();
/// let b = parse_timestamp("2026-10-19T12:02:00+02:00").unwrap();
/// assert_eq!(a, b);
///
/// // Missing offset is rejected
/// assert!(parse_timestamp("2026-10-19T10:02:00").is_err());
/// assert!(parse_timestamp("not a time").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TimestampError {
            value: s.to_string(),
            reason: e.to_string(),
        })
}

/// Format an instant as RFC 3339 with millisecond precision and a `Z` suffix.
///
/// ```
/// use kiosk_server::domain::{format_timestamp, parse_timestamp};
///
/// let t = parse_timestamp("2026-10-19T12:02:00+02:00").unwrap();
/// assert_eq!(format_timestamp(t), "2026-10-19T10:02:00.000Z");
/// ```
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Shift an instant by a signed number of seconds.
///
/// Returns `None` if the result is out of range.
pub fn add_seconds(t: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs).and_then(|d| t.checked_add_signed(d))
}

/// Absolute distance between two instants.
pub fn abs_diff(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    a.signed_duration_since(b).abs()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// format then parse gives back the same instant (at millisecond precision)
        #[test]
        fn format_parse_roundtrip(millis in 0i64..4_102_444_800_000) {
            let t = DateTime::<Utc>::from_timestamp_millis(millis).unwrap();
            prop_assert_eq!(parse_timestamp(&format_timestamp(t)).unwrap(), t);
        }
    }
}
