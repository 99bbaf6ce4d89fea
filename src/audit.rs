//! A durable, append-only log of every event attempt, success or failure. The
//! sink is at-least-once: a crash mid-write may leave a partial trailing line,
//! which readers are expected to discard.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::event::Event;

/// The four outcomes a write attempt can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditType {
    Success,
    ValidationFailure,
    AppendOnlyViolation,
    BoundaryViolation,
}

impl AuditType {
    pub fn is_failure(&self) -> bool {
        !matches!(self, AuditType::Success)
    }
}

/// One durable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_type: AuditType,
    pub event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub at: DateTime<Utc>,
}

/// Appends audit entries to a file, one JSON object per line, and mirrors them into
/// an in-memory vector for lock-free reads.
///
/// The sink opens the log in append mode for every write rather than holding the
/// file handle open -- simple, and safe against interleaving from other processes
/// that also append.
pub struct AuditSink {
    path: PathBuf,
    entries: Vec<AuditEntry>,
}

impl AuditSink {
    /// Opens (creating parent directories as needed) the audit log at `path`.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            entries: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry to the durable log and the in-memory mirror.
    ///
    /// The file write happens first: if it fails, the entry is not mirrored either,
    /// so the in-memory audit list and the on-disk log never diverge.
    pub fn append(&mut self, entry: AuditEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        file.flush()?;

        self.entries.push(entry);
        Ok(())
    }

    /// The full in-memory audit list, in append order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }
}

/// Reads an audit log file back into entries, tolerating a partial trailing line.
/// Intended for post-mortem tooling, not the hot write path.
pub fn read_audit_log(path: impl AsRef<Path>) -> std::io::Result<Vec<AuditEntry>> {
    let contents = fs::read_to_string(path)?;
    let mut entries = Vec::new();
    let mut lines = contents.lines().peekable();
    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(_) if lines.peek().is_none() => {
                // Trailing partial line at EOF: discard it.
            }
            Err(e) => return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        }
    }
    Ok(entries)
}
