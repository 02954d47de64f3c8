//! The arrivals CSV file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stopmon_types::{format_utc_seconds, ArrivalVisit, PollRecord};

/// Column names, written once when the file is created.
pub const CSV_HEADER: [&str; 6] = [
    "record",
    "polled_utc",
    "line",
    "destination",
    "arrival_utc",
    "minutes_away",
];

/// One data row, in header order.
#[derive(Debug, Serialize)]
struct ArrivalRow<'a> {
    record: u64,
    polled_utc: String,
    line: &'a str,
    destination: &'a str,
    arrival_utc: String,
    minutes_away: i64,
}

impl<'a> ArrivalRow<'a> {
    fn new(record: &PollRecord, visit: &'a ArrivalVisit) -> Self {
        Self {
            record: record.record_number,
            polled_utc: format_utc_seconds(&record.polled_utc),
            line: &visit.line,
            destination: &visit.destination,
            arrival_utc: format_utc_seconds(&visit.arrival_utc),
            minutes_away: visit.minutes_away(record.polled_utc),
        }
    }
}

/// Append-only CSV log of arrivals, one row per visit.
///
/// The writer is held for the lifetime of the log and flushed after every
/// row, so the file always ends with a complete, newline-terminated row.
#[derive(Debug)]
pub struct ArrivalLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ArrivalLog {
    /// Open (or create) the CSV file for appending.
    ///
    /// The header is written only when the file is new or empty; reopening
    /// an existing log never duplicates it.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let is_empty = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(e),
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        Ok(Self { path, writer })
    }

    /// Returns the path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and flush it.
    pub fn append(&mut self, record: &PollRecord, visit: &ArrivalVisit) -> io::Result<()> {
        self.writer.serialize(ArrivalRow::new(record, visit))?;
        self.writer.flush()
    }

    /// The record number of the last data row in an existing CSV file.
    ///
    /// Returns `None` when the file does not exist or holds no data rows.
    /// Rows that cannot be read, or whose first column is not a number, are
    /// ignored.
    pub fn last_record_number<P: AsRef<Path>>(path: P) -> io::Result<Option<u64>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        Ok(reader
            .records()
            .filter_map(Result::ok)
            .filter_map(|record| record.get(0).and_then(|n| n.trim().parse::<u64>().ok()))
            .last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn header_line() -> String {
        format!("{}\n", CSV_HEADER.join(","))
    }

    fn record(n: u64) -> PollRecord {
        PollRecord::new(n, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn visit(dest: &str) -> ArrivalVisit {
        ArrivalVisit::new("N", dest, Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 30).unwrap())
    }

    fn write_rows(path: &Path, rows: &[(u64, &str)]) {
        let mut log = ArrivalLog::open(path).unwrap();
        for (n, dest) in rows {
            log.append(&record(*n), &visit(dest)).unwrap();
        }
    }

    #[test]
    fn test_row_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");
        write_rows(&path, &[(3, "Ocean Beach")]);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!(
                "{}3,2024-01-01T00:00:00+00:00,N,Ocean Beach,2024-01-01T00:05:30+00:00,5\n",
                header_line()
            )
        );
    }

    #[test]
    fn test_fields_are_quoted_when_needed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");
        write_rows(&path, &[(1, "Geary, 33rd"), (2, "The \"Wiggle\"")]);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(",N,\"Geary, 33rd\","));
        assert!(content.contains(",N,\"The \"\"Wiggle\"\"\","));
    }

    #[test]
    fn test_new_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");
        write_rows(&path, &[(1, "Ocean Beach")]);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&header_line()));
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_reopen_does_not_duplicate_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");

        write_rows(&path, &[(1, "Ocean Beach")]);
        write_rows(&path, &[(1, "Caltrain")]);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(header_line().as_str()).count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");
        File::create(&path).unwrap();

        ArrivalLog::open(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), header_line());
    }

    #[test]
    fn test_last_record_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");

        assert_eq!(ArrivalLog::last_record_number(&path).unwrap(), None);

        ArrivalLog::open(&path).unwrap();
        assert_eq!(ArrivalLog::last_record_number(&path).unwrap(), None);

        write_rows(&path, &[(7, "Ocean Beach"), (9, "Caltrain")]);
        assert_eq!(ArrivalLog::last_record_number(&path).unwrap(), Some(9));
    }

    #[test]
    fn test_last_record_number_with_multiline_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arrivals.csv");

        write_rows(&path, &[(2, "Depot\n99, Main")]);

        assert_eq!(ArrivalLog::last_record_number(&path).unwrap(), Some(2));
    }
}
