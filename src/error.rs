//! Crate-wide error taxonomy.
//!
//! Business rejections (validation/boundary/append-only failures) are data, not
//! exceptions: they travel as a `Vec<FieldError>` inside [`LedgerError::Rejected`].
//! Only resource faults -- currently, the audit sink's durable write -- are modeled
//! as the kind of error that aborts an operation outright.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The taxonomy of structured field errors, shared by validation and boundary checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// A required field was absent, or a referenced entity does not exist.
    Missing,
    /// A field had the wrong type, an out-of-range value, or a blank string.
    Invalid,
    /// An id collided with one already stored.
    Duplicate,
    /// Two related fields disagree (e.g. fact kind != promotion kind).
    Mismatch,
    /// The payload carried fields this event type does not recognize.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Missing => "missing",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Mismatch => "mismatch",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One structured error: `{field, kind, message, detail?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<String>>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Vec<String>) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn missing(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Missing, message)
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Invalid, message)
    }

    pub fn duplicate(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Duplicate, message)
    }

    pub fn mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Mismatch, message)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.kind, self.message)
    }
}

/// Top-level error returned by every public [`crate::Ledger`] operation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The event was rejected before (or instead of) reaching the in-memory store.
    /// Carries every structured error gathered for the attempt -- cumulative for
    /// validation failures, singular for boundary/append-only failures.
    #[error("event rejected with {} error(s): {}", .0.len(), render_errors(.0))]
    Rejected(Vec<FieldError>),

    /// The audit sink could not durably record the attempt. The in-memory store is
    /// left untouched -- see the audit-first ordering decision in DESIGN.md.
    #[error("audit sink failed: {0}")]
    Audit(#[from] std::io::Error),
}

fn render_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LedgerError {
    /// Convenience constructor for a single-error rejection (boundary/append-only).
    pub fn rejected_one(error: FieldError) -> Self {
        LedgerError::Rejected(vec![error])
    }

    /// The structured errors carried by a rejection, if this is one.
    pub fn errors(&self) -> Option<&[FieldError]> {
        match self {
            LedgerError::Rejected(errors) => Some(errors),
            LedgerError::Audit(_) => None,
        }
    }
}
