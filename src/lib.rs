//! # stopmon
//!
//! Polls a SIRI StopMonitoring endpoint (such as 511.org) for one transit
//! stop and keeps a running log of the arrivals it predicts.
//!
//! Every poll produces a raw archive entry, zero or more CSV rows, and a
//! line per upcoming vehicle on the console. The archive can later be
//! replayed to regenerate the CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          StopMonitor                         │
//! │  ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌────────┐  │
//! │  │  source  │───▶│ archive  │───▶│  parse   │───▶│ record │  │
//! │  │ (fetch)  │    │ (.jsonl) │    │(adapters)│    │ (.csv) │  │
//! │  └──────────┘    └──────────┘    └──────────┘    └────────┘  │
//! │       ▲                                                      │
//! │       └── HttpSource | any ArrivalSource                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: where responses come from ([`ArrivalSource`] trait), plus
//!   [`ArchiveReader`] for reading archives back
//! - **[`output`]**: the archive, the CSV log and the console feed
//! - **[`monitor`]**: the sequential poll loop and its shutdown handling
//! - **[`replay`]**: re-parse an archive into a fresh CSV
//! - **[`config`]**: layered settings from defaults, file, environment and CLI
//!
//! Payload parsing lives in `stopmon-adapters`; the shared data types live in
//! `stopmon-types`.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll stop 16633 every 62 seconds
//! STOPMON_API_KEY=... stopmon --stop 16633
//!
//! # Regenerate a CSV from an archive
//! stopmon --replay stop_16633_raw.jsonl --csv replayed.csv
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::time::Duration;
//! use stopmon::{ArchiveLog, ArrivalLog, Console, HttpSource, Recorder, Settings, StopMonitor};
//! use stopmon::config::Overrides;
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::load(None, &Overrides::default()).unwrap();
//! let source = HttpSource::from_settings(&settings).unwrap();
//! let recorder = Recorder::new(
//!     ArrivalLog::open(&settings.csv_path).unwrap(),
//!     Console::stdout(),
//! );
//! let archive = ArchiveLog::open(&settings.archive_path).unwrap();
//!
//! let mut monitor = StopMonitor::new(source, recorder, archive, settings.poll_interval);
//! let stats = monitor.run(tokio::signal::ctrl_c()).await;
//! println!("{} polls", stats.cycles);
//! # });
//! ```

pub mod config;
pub mod duration;
pub mod monitor;
pub mod output;
pub mod replay;
pub mod source;

pub use config::Settings;
pub use monitor::{MonitorState, MonitorStats, StopMonitor};
pub use output::{ArchiveLog, ArrivalLog, Console, Recorder};
pub use replay::{replay, ReplayStats};
pub use source::{ArchiveReader, ArchiveRecord, ArrivalSource, HttpSource};
pub use stopmon_types::{ArchiveEntry, ArrivalVisit, PollRecord};
