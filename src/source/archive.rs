//! Archive-file source.
//!
//! Reads a JSON-lines archive written by the monitor back into
//! [`ArchiveEntry`] values, one per line, for replay.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use stopmon_types::ArchiveEntry;

/// One line of an archive file.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveRecord {
    /// A well-formed entry.
    Entry(ArchiveEntry),
    /// A line that could not be parsed as an entry.
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Why parsing failed.
        error: String,
    },
}

/// Iterates over the entries of an archive file.
///
/// Blank lines are ignored. Malformed lines are reported as
/// [`ArchiveRecord::Malformed`] so the caller can skip them and carry on;
/// only I/O errors end iteration early.
#[derive(Debug)]
pub struct ArchiveReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl ArchiveReader {
    /// Open an archive file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for ArchiveReader {
    type Item = io::Result<ArchiveRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let record = match serde_json::from_str::<ArchiveEntry>(&line) {
                Ok(entry) => ArchiveRecord::Entry(entry),
                Err(e) => ArchiveRecord::Malformed {
                    line: self.line_number,
                    error: format!("Parse error: {}", e),
                },
            };
            return Some(Ok(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry_line(ts: &str, payload: &str) -> String {
        format!(r#"{{"polled_utc":"{}","payload":{}}}"#, ts, payload)
    }

    #[test]
    fn test_reads_entries_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", entry_line("2024-01-01T00:00:00+00:00", "{}")).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", entry_line("2024-01-01T00:01:02+00:00", "null")).unwrap();

        let records: Vec<_> = ArchiveReader::open(file.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        match &records[1] {
            ArchiveRecord::Entry(entry) => {
                assert_eq!(entry.polled_utc.to_rfc3339(), "2024-01-01T00:01:02+00:00");
                assert!(entry.payload.is_null());
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_lines_are_reported_with_line_numbers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", entry_line("2024-01-01T00:00:00+00:00", "{}")).unwrap();
        writeln!(file, "not valid json").unwrap();
        writeln!(file, r#"{{"payload":{{}}}}"#).unwrap();

        let records: Vec<_> = ArchiveReader::open(file.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], ArchiveRecord::Entry(_)));
        assert!(matches!(records[1], ArchiveRecord::Malformed { line: 2, .. }));
        assert!(matches!(records[2], ArchiveRecord::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ArchiveReader::open("/nonexistent/path/raw.jsonl").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
