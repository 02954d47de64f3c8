//! ISO-8601 timestamps at second precision.
//!
//! Every timestamp that leaves the monitor (CSV rows, archive lines) uses the
//! same shape: seconds precision with an explicit offset, e.g.
//! `2024-01-01T00:00:00+00:00`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as ISO-8601 with second precision and `+00:00`.
pub fn format_utc_seconds(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Serde adapter for [`format_utc_seconds`].
///
/// Use with `#[serde(with = "stopmon_types::iso_seconds")]`. Deserialization
/// accepts any RFC 3339 timestamp and normalizes it to UTC.
#[cfg(feature = "serde")]
pub mod iso_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_utc_seconds(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
