//! Per-poll records: the poll itself and its raw archive entry.

use chrono::{DateTime, Utc};

/// One poll cycle.
///
/// Record numbers start at 1 and increase by one per cycle, whether or not
/// the cycle produced any visits. Every CSV row written for a cycle carries
/// that cycle's number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollRecord {
    /// Monotonically increasing cycle number.
    pub record_number: u64,

    /// When the poll was issued.
    pub polled_utc: DateTime<Utc>,
}

impl PollRecord {
    /// Create a record with an explicit number.
    pub fn new(record_number: u64, polled_utc: DateTime<Utc>) -> Self {
        Self {
            record_number,
            polled_utc,
        }
    }

    /// The first record of a session.
    pub fn first(polled_utc: DateTime<Utc>) -> Self {
        Self::new(1, polled_utc)
    }

    /// The record following this one, polled at `polled_utc`.
    pub fn next(&self, polled_utc: DateTime<Utc>) -> Self {
        Self::new(self.record_number + 1, polled_utc)
    }
}

/// One raw upstream response plus its poll timestamp.
///
/// Archive entries are appended once per cycle, one JSON object per line.
/// When the request failed the payload is `null`; when the body could not
/// be decoded it holds the body as a string. Either way `error` says why.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use stopmon_types::ArchiveEntry;
///
/// let polled = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let entry = ArchiveEntry::new(polled, serde_json::json!({"ServiceDelivery": {}}));
///
/// let line = serde_json::to_string(&entry).unwrap();
/// assert_eq!(
///     line,
///     r#"{"polled_utc":"2024-01-01T00:00:00+00:00","payload":{"ServiceDelivery":{}}}"#
/// );
/// ```
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArchiveEntry {
    /// When the poll was issued.
    #[serde(with = "crate::iso_seconds")]
    pub polled_utc: DateTime<Utc>,

    /// The full decoded upstream response, or its raw text when it could
    /// not be decoded.
    pub payload: serde_json::Value,

    /// Why the poll failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(feature = "serde")]
impl ArchiveEntry {
    /// An entry for a successfully decoded response.
    pub fn new(polled_utc: DateTime<Utc>, payload: serde_json::Value) -> Self {
        Self {
            polled_utc,
            payload,
            error: None,
        }
    }

    /// An entry for a poll whose request failed.
    pub fn failed(polled_utc: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            polled_utc,
            payload: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    /// Whether this entry records a failed poll.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
