//! # stopmon-adapters
//!
//! Upstream adapters for transit stop monitoring.
//!
//! This crate talks to the outside world on behalf of the monitor: it fetches
//! raw StopMonitoring responses and turns them into normalized
//! [`ArrivalVisit`] values, tolerating the many shapes the upstream API
//! produces.
//!
//! ## Modules
//!
//! - **[`payload`]** - Body decoding (with byte-order-mark fallback) and the
//!   tolerant SIRI payload parser. Always available.
//! - **`siri`** (`siri` feature, default) - HTTP client for a SIRI
//!   StopMonitoring endpoint such as the 511.org transit API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stopmon_adapters::payload::{decode_body, parse_payload};
//! use stopmon_adapters::siri::StopMonitoringAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = StopMonitoringAdapter::builder()
//!         .api_key("your-511-key")
//!         .stop_code("16633")
//!         .build()?;
//!
//!     let visits = parse_payload(&decode_body(&adapter.fetch().await?)?);
//!     println!("{} upcoming arrivals", visits.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod payload;

#[cfg(feature = "siri")]
pub mod siri;

pub use error::AdapterError;

// Re-export types for convenience
pub use stopmon_types::{ArchiveEntry, ArrivalVisit, PollRecord};
