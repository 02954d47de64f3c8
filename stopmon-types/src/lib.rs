//! # stopmon-types
//!
//! Core types for transit stop monitoring. This crate defines the records a
//! stop monitor produces on every poll: the normalized arrivals it parsed,
//! the poll they belong to, and the raw archive entry kept for replay.
//!
//! ## Features
//!
//! - `serde` (default): serialization via serde, and the [`ArchiveEntry`]
//!   type which wraps a raw `serde_json::Value` payload
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use stopmon_types::{ArrivalVisit, PollRecord};
//!
//! let polled = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let visit = ArrivalVisit::new(
//!     "N",
//!     "Ocean Beach",
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 30).unwrap(),
//! );
//!
//! let record = PollRecord::first(polled);
//! assert_eq!(record.record_number, 1);
//! assert_eq!(visit.minutes_away(record.polled_utc), 5);
//! ```

mod record;
mod timestamp;
mod visit;

pub use record::*;
pub use timestamp::*;
pub use visit::*;
