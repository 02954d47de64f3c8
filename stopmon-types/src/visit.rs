//! A single expected arrival at the monitored stop.

use chrono::{DateTime, Utc};

/// One upstream-reported expected arrival of a vehicle at the stop.
///
/// Visits are derived fresh on every poll and are never held across
/// cycles; only their fields end up on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrivalVisit {
    /// Published line name (e.g. "N", "38R").
    pub line: String,

    /// Destination display name.
    pub destination: String,

    /// Expected arrival time, normalized to UTC.
    pub arrival_utc: DateTime<Utc>,
}

impl ArrivalVisit {
    /// Create a new visit.
    pub fn new(
        line: impl Into<String>,
        destination: impl Into<String>,
        arrival_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            line: line.into(),
            destination: destination.into(),
            arrival_utc,
        }
    }

    /// Whole minutes between `polled_at` and the expected arrival.
    ///
    /// The signed difference in seconds is divided by 60 and truncated
    /// toward zero, so an arrival 30 seconds in the past is `0`, not `-1`.
    pub fn minutes_away(&self, polled_at: DateTime<Utc>) -> i64 {
        (self.arrival_utc - polled_at).num_seconds() / 60
    }
}
