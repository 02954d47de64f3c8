//! The polling loop.
//!
//! [`StopMonitor`] drives one [`ArrivalSource`] through a strictly sequential
//! cycle: fetch, archive, parse, record, sleep. Only one request is ever in
//! flight and nothing runs in the background.
//!
//! ```text
//!          ┌──────────────── sleep(interval) ◀───────────────┐
//!          ▼                                                  │
//!     ┌─────────┐  fetch   ┌─────────┐  archive, parse,  ┌─────────┐
//!     │  Idle   │─────────▶│ Polling │──────────────────▶│  Idle   │
//!     └─────────┘          └─────────┘      record       └─────────┘
//! ```
//!
//! A failed or unreadable poll never stops the loop; it is archived, logged,
//! and treated as a poll with no visits. Only the shutdown future ends it.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use stopmon_adapters::payload::{decode_body, parse_payload_detailed};
use stopmon_types::{ArchiveEntry, ArrivalVisit, PollRecord};
use tracing::{debug, error, info, warn};

use crate::duration::format_duration;
use crate::output::{ArchiveLog, Recorder};
use crate::source::ArrivalSource;

/// Where the monitor is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Between polls.
    Idle,
    /// A request is in flight.
    Polling,
}

/// Running totals for one monitoring session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Completed poll cycles.
    pub cycles: u64,
    /// Cycles whose request failed or whose body could not be decoded.
    pub failed_polls: u64,
    /// CSV rows written.
    pub visits_recorded: u64,
    /// Visits dropped because they were missing required fields.
    pub visits_skipped: u64,
    /// Archive or CSV writes that failed.
    pub write_errors: u64,
}

/// Polls a stop and records what it reports.
#[derive(Debug)]
pub struct StopMonitor<S: ArrivalSource> {
    source: S,
    recorder: Recorder,
    archive: ArchiveLog,
    interval: Duration,
    next_record: u64,
    state: MonitorState,
    stats: MonitorStats,
}

impl<S: ArrivalSource> StopMonitor<S> {
    /// Create a monitor. Record numbering starts at 1.
    pub fn new(source: S, recorder: Recorder, archive: ArchiveLog, interval: Duration) -> Self {
        Self {
            source,
            recorder,
            archive,
            interval,
            next_record: 1,
            state: MonitorState::Idle,
            stats: MonitorStats::default(),
        }
    }

    /// Continue numbering after `last`, e.g. the last record in an existing CSV.
    pub fn resume_after(mut self, last: u64) -> Self {
        self.next_record = last.saturating_add(1);
        self
    }

    /// Returns the current state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Returns the totals so far.
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Returns the number the next cycle will be recorded under.
    pub fn next_record_number(&self) -> u64 {
        self.next_record
    }

    /// Fetch once, archive the response, and parse it.
    ///
    /// Always archives exactly one entry. Transport and decode failures are
    /// logged and yield no visits.
    pub async fn poll(&mut self, polled_at: DateTime<Utc>) -> Vec<ArrivalVisit> {
        self.state = MonitorState::Polling;
        debug!("Polling {}", self.source.description());

        let raw = match self.source.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Poll failed: {}", e);
                self.stats.failed_polls += 1;
                self.write_archive(&ArchiveEntry::failed(polled_at, e.to_string()));
                return Vec::new();
            }
        };

        let Some(payload) = self.archive_raw(&raw, polled_at) else {
            self.stats.failed_polls += 1;
            return Vec::new();
        };

        let parsed = parse_payload_detailed(&payload);
        if !parsed.recognized {
            warn!("Response has no stop monitoring delivery");
        }
        if parsed.skipped > 0 {
            debug!("Skipped {} visits with missing fields", parsed.skipped);
            self.stats.visits_skipped += parsed.skipped as u64;
        }
        parsed.visits
    }

    /// Decode a raw response and append it to the archive.
    ///
    /// An undecodable body is archived as text alongside the decode error.
    /// Returns the decoded payload, if any.
    pub fn archive_raw(&mut self, raw: &[u8], polled_at: DateTime<Utc>) -> Option<Value> {
        match decode_body(raw) {
            Ok(payload) => {
                self.write_archive(&ArchiveEntry::new(polled_at, payload.clone()));
                Some(payload)
            }
            Err(e) => {
                warn!("Could not decode response: {}", e);
                let entry = ArchiveEntry {
                    polled_utc: polled_at,
                    payload: Value::String(String::from_utf8_lossy(raw).into_owned()),
                    error: Some(e.to_string()),
                };
                self.write_archive(&entry);
                None
            }
        }
    }

    /// Write one cycle's visits to the CSV log and the console.
    ///
    /// Consumes the next record number whether or not there are visits.
    pub fn record_poll(&mut self, visits: &[ArrivalVisit], polled_at: DateTime<Utc>) {
        let record = PollRecord::new(self.next_record, polled_at);
        self.next_record = self.next_record.saturating_add(1);

        match self.recorder.record_poll(&record, visits) {
            Ok(rows) => self.stats.visits_recorded += rows as u64,
            Err(e) => {
                error!(
                    "Failed to write {}: {}",
                    self.recorder.arrivals().path().display(),
                    e
                );
                self.stats.write_errors += 1;
            }
        }
    }

    /// Run one full cycle: poll, then record.
    pub async fn run_cycle(&mut self) {
        let polled_at = Utc::now();
        let visits = self.poll(polled_at).await;
        self.record_poll(&visits, polled_at);
        self.stats.cycles += 1;
        self.state = MonitorState::Idle;
    }

    /// Run a single cycle unless `shutdown` completes first.
    ///
    /// Returns `false` if the cycle was interrupted, in which case nothing
    /// was written for it.
    pub async fn run_once<F: Future>(&mut self, shutdown: F) -> bool {
        let completed = tokio::select! {
            _ = self.run_cycle() => true,
            _ = shutdown => false,
        };
        self.state = MonitorState::Idle;
        completed
    }

    /// Poll until `shutdown` completes, sleeping the configured interval
    /// between cycles.
    ///
    /// Shutdown is honoured both mid-request and mid-sleep. An interrupted
    /// request writes nothing, so the output files only ever hold complete
    /// records.
    pub async fn run<F: Future>(&mut self, shutdown: F) -> MonitorStats {
        tokio::pin!(shutdown);
        info!(
            "Monitoring {} every {}",
            self.source.description(),
            format_duration(self.interval)
        );

        loop {
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = &mut shutdown => break,
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => break,
            }
        }

        self.state = MonitorState::Idle;
        self.stats
    }

    fn write_archive(&mut self, entry: &ArchiveEntry) {
        if let Err(e) = self.archive.append(entry) {
            error!("Failed to write {}: {}", self.archive.path().display(), e);
            self.stats.write_errors += 1;
        }
    }
}
