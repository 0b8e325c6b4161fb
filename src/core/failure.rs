//! Durable failure log
//!
//! Failed records are written to a two-column CSV (record label, error
//! text) with enough context for manual replay. Nothing in the log is
//! retried automatically within a run.
//!
//! The insert log is truncated and given a fresh header at the start of a
//! run, because a replayed insert run regenerates the same failures. The
//! update log is appended to across runs (header written only when the
//! file is new), since updates may be invoked incrementally.

use crate::domain::errors::MigrationError;
use crate::domain::result::Result;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const HEADER: [&str; 2] = ["record", "error"];

/// How to open the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLogMode {
    /// Truncate and write a fresh header (insert path).
    Truncate,
    /// Append; write a header only if the file is new or empty (update path).
    Append,
}

/// Append-only failure log backed by a CSV file.
pub struct FailureLog {
    writer: csv::Writer<File>,
    path: PathBuf,
    entries: usize,
}

impl FailureLog {
    /// Open (or create) a failure log at `path`.
    pub fn open(path: impl AsRef<Path>, mode: FailureLogMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let (file, needs_header) = match mode {
            FailureLogMode::Truncate => {
                let file = File::create(&path)?;
                (file, true)
            }
            FailureLogMode::Append => {
                let existing_len = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                (file, existing_len == 0)
            }
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(HEADER).map_err(MigrationError::from)?;
            writer.flush()?;
        }

        Ok(Self {
            writer,
            path,
            entries: 0,
        })
    }

    /// Append one failure entry and flush it to disk.
    ///
    /// Flushing per entry keeps the log intact even if the run dies before
    /// the writer is dropped.
    pub fn record(&mut self, label: &str, error: &str) -> Result<()> {
        self.writer
            .write_record([label, error])
            .map_err(MigrationError::from)?;
        self.writer.flush()?;
        self.entries += 1;

        tracing::warn!(record = label, error = error, "Recorded migration failure");
        Ok(())
    }

    /// Number of entries written through this handle.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_truncate_mode_writes_header_and_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_inserts.csv");

        let mut log = FailureLog::open(&path, FailureLogMode::Truncate).unwrap();
        log.record("SPEC-001", "No target context for protocol 'P-9'")
            .unwrap();
        log.record("SPEC-002", "duplicate key").unwrap();
        assert_eq!(log.entries(), 2);
        drop(log);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "record,error");
        assert!(lines[1].starts_with("SPEC-001,"));
    }

    #[test]
    fn test_truncate_mode_discards_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_inserts.csv");

        let mut log = FailureLog::open(&path, FailureLogMode::Truncate).unwrap();
        log.record("OLD", "stale failure").unwrap();
        drop(log);

        let log = FailureLog::open(&path, FailureLogMode::Truncate).unwrap();
        drop(log);

        let lines = read_lines(&path);
        assert_eq!(lines, vec!["record,error"]);
    }

    #[test]
    fn test_append_mode_accumulates_across_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_updates.csv");

        let mut log = FailureLog::open(&path, FailureLogMode::Append).unwrap();
        log.record("SPEC-001", "first run").unwrap();
        drop(log);

        let mut log = FailureLog::open(&path, FailureLogMode::Append).unwrap();
        log.record("SPEC-002", "second run").unwrap();
        drop(log);

        let lines = read_lines(&path);
        // Header once, then one entry per run.
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "record,error");
        assert!(lines[1].contains("first run"));
        assert!(lines[2].contains("second run"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed.csv");

        let mut log = FailureLog::open(&path, FailureLogMode::Truncate).unwrap();
        log.record("SPEC-001", "constraint violated, key (entry_id)=(7)")
            .unwrap();
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"constraint violated, key (entry_id)=(7)\""));
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("failed.csv");
        let log = FailureLog::open(&path, FailureLogMode::Truncate).unwrap();
        assert!(log.path().exists());
    }
}
