//! The raw-response archive file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stopmon_types::ArchiveEntry;

/// Append-only JSON-lines archive of raw responses, one entry per poll.
#[derive(Debug)]
pub struct ArchiveLog {
    path: PathBuf,
    file: File,
}

impl ArchiveLog {
    /// Open (or create) the archive file for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Returns the path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single line and flush it.
    pub fn append(&mut self, entry: &ArchiveEntry) -> io::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_appends_one_line_per_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.jsonl");
        let polled = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut log = ArchiveLog::open(&path).unwrap();
        log.append(&ArchiveEntry::new(polled, json!({"ServiceDelivery": {"a": [1, 2]}})))
            .unwrap();
        log.append(&ArchiveEntry::failed(polled, "Request timed out")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(content.ends_with('\n'));

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["polled_utc"], "2024-01-01T00:00:00+00:00");
        assert_eq!(first["payload"]["ServiceDelivery"]["a"][1], 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second["payload"].is_null());
        assert_eq!(second["error"], "Request timed out");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.jsonl");
        let polled = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        ArchiveLog::open(&path).unwrap().append(&ArchiveEntry::new(polled, json!({}))).unwrap();
        ArchiveLog::open(&path).unwrap().append(&ArchiveEntry::new(polled, json!({}))).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
