//! Durable checkpoint and result persistence.
//!
//! Both stores are newline-delimited append-only files. The checkpoint holds
//! every candidate ever attempted (any verdict); the result log holds only
//! candidates classified available. Every append is written and flushed
//! before the caller continues, so an interrupted run resumes without
//! re-probing or losing discoveries.
//!
//! Any I/O failure here is fatal to a run: a checkpoint that silently stops
//! recording would re-probe thousands of candidates on the next start.

use crate::error::HandleCheckError;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

fn file_error(path: &Path, what: &str, err: std::io::Error) -> HandleCheckError {
    HandleCheckError::file_error(path.to_string_lossy(), format!("{}: {}", what, err))
}

/// The set of previously-probed candidates, backed by an append-only file.
pub struct CheckpointSet {
    path: PathBuf,
    seen: HashSet<String>,
    file: File,
}

impl CheckpointSet {
    /// Load the checkpoint file into memory and open it for appending.
    ///
    /// A missing file yields an empty set — the normal state of a fresh run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HandleCheckError> {
        let path = path.as_ref().to_path_buf();
        let mut seen = HashSet::new();

        if path.exists() {
            let reader = BufReader::new(
                File::open(&path).map_err(|e| file_error(&path, "Failed to open checkpoint", e))?,
            );
            for line in reader.lines() {
                let line = line.map_err(|e| file_error(&path, "Failed to read checkpoint", e))?;
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    seen.insert(trimmed.to_string());
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| file_error(&path, "Failed to open checkpoint for append", e))?;

        Ok(Self { path, seen, file })
    }

    /// Whether this candidate was already probed in a previous run (or
    /// earlier in this one).
    pub fn contains(&self, username: &str) -> bool {
        self.seen.contains(username)
    }

    /// Record a probed candidate, durably, before the caller moves on.
    ///
    /// Recording the same candidate twice is a no-op.
    pub fn record(&mut self, username: &str) -> Result<(), HandleCheckError> {
        if !self.seen.insert(username.to_string()) {
            return Ok(());
        }
        writeln!(self.file, "{}", username)
            .map_err(|e| file_error(&self.path, "Failed to append to checkpoint", e))?;
        self.file
            .flush()
            .map_err(|e| file_error(&self.path, "Failed to flush checkpoint", e))?;
        Ok(())
    }

    /// Number of candidates recorded so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no candidates have been recorded.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Append-only log of candidates classified available.
pub struct ResultLog {
    path: PathBuf,
    file: File,
}

impl ResultLog {
    /// Open (creating if needed) the result log for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HandleCheckError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| file_error(&path, "Failed to open result log", e))?;
        Ok(Self { path, file })
    }

    /// Append a discovered username, durably, before the caller moves on.
    pub fn append(&mut self, username: &str) -> Result<(), HandleCheckError> {
        writeln!(self.file, "{}", username)
            .map_err(|e| file_error(&self.path, "Failed to append to result log", e))?;
        self.file
            .flush()
            .map_err(|e| file_error(&self.path, "Failed to flush result log", e))?;
        Ok(())
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = CheckpointSet::load(dir.path().join("missing.txt")).unwrap();
        assert!(checkpoint.is_empty());
        assert_eq!(checkpoint.len(), 0);
    }

    #[test]
    fn test_record_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checked.txt");

        let mut checkpoint = CheckpointSet::load(&path).unwrap();
        checkpoint.record("aaa").unwrap();
        checkpoint.record("aab").unwrap();
        drop(checkpoint);

        let reloaded = CheckpointSet::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("aaa"));
        assert!(reloaded.contains("aab"));
        assert!(!reloaded.contains("aac"));
    }

    #[test]
    fn test_record_is_durable_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checked.txt");

        let mut checkpoint = CheckpointSet::load(&path).unwrap();
        checkpoint.record("abc").unwrap();

        // Visible on disk immediately, without dropping the handle
        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "abc\n");
    }

    #[test]
    fn test_record_duplicate_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checked.txt");

        let mut checkpoint = CheckpointSet::load(&path).unwrap();
        checkpoint.record("abc").unwrap();
        checkpoint.record("abc").unwrap();

        assert_eq!(checkpoint.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\n");
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checked.txt");
        fs::write(&path, "aaa\n\n  \naab\n").unwrap();

        let checkpoint = CheckpointSet::load(&path).unwrap();
        assert_eq!(checkpoint.len(), 2);
    }

    #[test]
    fn test_append_preserves_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checked.txt");
        fs::write(&path, "old\n").unwrap();

        let mut checkpoint = CheckpointSet::load(&path).unwrap();
        assert!(checkpoint.contains("old"));
        checkpoint.record("new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_result_log_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("available.txt");

        let mut log = ResultLog::open(&path).unwrap();
        log.append("aaa").unwrap();
        log.append("zz9").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "aaa\nzz9\n");
    }

    #[test]
    fn test_result_log_append_is_durable_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("available.txt");

        let mut log = ResultLog::open(&path).unwrap();
        log.append("abc").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\n");
    }
}
