//! Re-run the parser over an existing archive.
//!
//! Each archived response is parsed again as if it had just been polled at
//! its recorded time, and the results are written through a [`Recorder`].
//! This regenerates a CSV from raw responses, e.g. after the parser learns a
//! new payload shape.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stopmon_adapters::payload::parse_payload_detailed;
use stopmon_types::PollRecord;
use tracing::{debug, warn};

use crate::output::Recorder;
use crate::source::{ArchiveReader, ArchiveRecord};

/// Totals for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Archive entries replayed, including failed polls.
    pub entries: u64,
    /// Entries that recorded a failed poll.
    pub failed_polls: u64,
    /// Lines that were not valid archive entries.
    pub malformed: u64,
    /// CSV rows written.
    pub visits_recorded: u64,
}

/// The CSV a replay of `archive_path` writes to when none is given.
///
/// Sits next to the archive and never coincides with the live CSV:
/// `stop_16633_raw.jsonl` replays into `stop_16633_replayed.csv`.
pub fn default_output_path(archive_path: &Path) -> PathBuf {
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_suffix("_raw").unwrap_or(&stem);
    let name = if stem.is_empty() {
        "replayed.csv".to_string()
    } else {
        format!("{}_replayed.csv", stem)
    };
    archive_path.with_file_name(name)
}

/// Replay every entry of `archive_path` into `recorder`.
///
/// Entries are numbered from 1 in file order, one number per entry, the same
/// way the live monitor numbers poll cycles. Malformed lines are logged and
/// skipped without consuming a number.
pub fn replay(archive_path: &Path, recorder: &mut Recorder) -> Result<ReplayStats> {
    let reader = ArchiveReader::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;

    let mut stats = ReplayStats::default();
    let mut record: Option<PollRecord> = None;

    for item in reader {
        let entry = match item.context("Failed to read archive")? {
            ArchiveRecord::Entry(entry) => entry,
            ArchiveRecord::Malformed { line, error } => {
                warn!("Skipping archive line {}: {}", line, error);
                stats.malformed += 1;
                continue;
            }
        };

        let current = match record {
            Some(prev) => prev.next(entry.polled_utc),
            None => PollRecord::first(entry.polled_utc),
        };
        record = Some(current);
        stats.entries += 1;

        let visits = if entry.is_failure() {
            debug!(
                "Archived poll {} failed: {}",
                current.record_number,
                entry.error.as_deref().unwrap_or_default()
            );
            stats.failed_polls += 1;
            Vec::new()
        } else {
            parse_payload_detailed(&entry.payload).visits
        };

        let rows = recorder
            .record_poll(&current, &visits)
            .with_context(|| format!("Failed to write {}", recorder.arrivals().path().display()))?;
        stats.visits_recorded += rows as u64;
    }

    Ok(stats)
}
