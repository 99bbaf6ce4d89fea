//! Configuration.
//!
//! The core reads exactly one environment variable, `LOG_ROOT`, and only once, at
//! construction. Everything else about a [`crate::Ledger`] is supplied explicitly
//! by the caller -- there is no process-wide singleton.

use std::path::PathBuf;

/// The fixed audit file name within `log_root`.
pub const AUDIT_FILE_NAME: &str = "sidecar-audit.edn";

/// Configuration for a [`crate::Ledger`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub log_root: PathBuf,
}

impl LedgerConfig {
    /// Builds a config pointing directly at `log_root`.
    pub fn new(log_root: impl Into<PathBuf>) -> Self {
        Self {
            log_root: log_root.into(),
        }
    }

    /// Resolves `LOG_ROOT` from the environment, defaulting to `./log`. This is a
    /// convenience for default construction only; library code never reads the
    /// environment itself once a `LedgerConfig` exists.
    pub fn from_env() -> Self {
        let log_root = std::env::var("LOG_ROOT").unwrap_or_else(|_| "./log".to_string());
        Self::new(log_root)
    }

    /// The full path to the audit file under `log_root`.
    pub fn audit_path(&self) -> PathBuf {
        self.log_root.join(AUDIT_FILE_NAME)
    }
}
