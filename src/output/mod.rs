//! Output backends for recorded polls.
//!
//! A poll produces two kinds of output:
//!
//! - [`ArchiveLog`]: the raw upstream response, one JSON line per poll
//! - [`ArrivalLog`]: the parsed visits, one CSV row per visit
//!
//! and a human-readable feed on the [`Console`]. The [`Recorder`] pairs the
//! CSV log with the console so live polling and replay render visits the
//! same way.

mod archive;
mod arrivals;
mod console;

pub use archive::ArchiveLog;
pub use console::{format_empty_line, format_visit_line, Console};
pub use arrivals::{ArrivalLog, CSV_HEADER};

use std::io;

use stopmon_types::{ArrivalVisit, PollRecord};
use tracing::warn;

/// Writes parsed visits to the CSV log and the console.
#[derive(Debug)]
pub struct Recorder {
    arrivals: ArrivalLog,
    console: Console,
}

impl Recorder {
    /// Create a recorder from an open CSV log and a console.
    pub fn new(arrivals: ArrivalLog, console: Console) -> Self {
        Self { arrivals, console }
    }

    /// Returns the CSV log.
    pub fn arrivals(&self) -> &ArrivalLog {
        &self.arrivals
    }

    /// Record every visit of one poll.
    ///
    /// Each visit gets one CSV row and one console line. A poll with no
    /// visits writes no rows and prints a single "no visits" line.
    ///
    /// All rows are written before anything is printed. Console failures
    /// are logged and never cost a row; only CSV errors are returned.
    ///
    /// Returns the number of rows written.
    pub fn record_poll(&mut self, record: &PollRecord, visits: &[ArrivalVisit]) -> io::Result<usize> {
        for visit in visits {
            self.arrivals.append(record, visit)?;
        }

        if let Err(e) = self.print_poll(record, visits) {
            warn!("Failed to write console output: {}", e);
        }
        Ok(visits.len())
    }

    fn print_poll(&mut self, record: &PollRecord, visits: &[ArrivalVisit]) -> io::Result<()> {
        if visits.is_empty() {
            return self.console.no_visits(record.polled_utc);
        }
        for visit in visits {
            let minutes = visit.minutes_away(record.polled_utc);
            self.console.visit(record.polled_utc, visit, minutes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// A terminal that has gone away, e.g. `stopmon | head` after `head` exits.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }
    }

    fn recorder_with(dir: &TempDir, console: Console) -> Recorder {
        let arrivals = ArrivalLog::open(dir.path().join("arrivals.csv")).unwrap();
        Recorder::new(arrivals, console)
    }

    fn recorder(dir: &TempDir) -> Recorder {
        recorder_with(dir, Console::new(Box::new(io::sink())))
    }

    fn visits() -> Vec<ArrivalVisit> {
        vec![
            ArrivalVisit::new("N", "Ocean Beach", Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 30).unwrap()),
            ArrivalVisit::new("N", "Caltrain", Utc.with_ymd_and_hms(2024, 1, 1, 0, 12, 0).unwrap()),
            ArrivalVisit::new("7", "Haight + Stanyan", Utc.with_ymd_and_hms(2024, 1, 1, 0, 20, 0).unwrap()),
        ]
    }

    #[test]
    fn test_record_poll_writes_one_row_per_visit() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder(&dir);
        let record = PollRecord::first(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(recorder.record_poll(&record, &visits()[..2]).unwrap(), 2);

        let content = fs::read_to_string(recorder.arrivals().path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,2024-01-01T00:00:00+00:00,N,Ocean Beach,"));
        assert!(lines[1].ends_with(",5"));
        assert!(lines[2].ends_with(",12"));
    }

    #[test]
    fn test_record_poll_without_visits_writes_no_rows() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder(&dir);
        let record = PollRecord::first(Utc::now());

        assert_eq!(recorder.record_poll(&record, &[]).unwrap(), 0);

        let content = fs::read_to_string(recorder.arrivals().path()).unwrap();
        assert_eq!(content, format!("{}\n", CSV_HEADER.join(",")));
    }

    #[test]
    fn test_console_failure_keeps_every_row() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder_with(&dir, Console::new(Box::new(BrokenPipe)));
        let record = PollRecord::first(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(recorder.record_poll(&record, &visits()).unwrap(), 3);
        assert_eq!(recorder.record_poll(&record.next(Utc::now()), &[]).unwrap(), 0);

        let content = fs::read_to_string(recorder.arrivals().path()).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.ends_with('\n'));
    }
}
