//! Error types for change sources.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by sentinels.
///
/// `InvalidConfig` stops a source from being built, `InitFailed` and
/// `PathWatchFailed` stop it from starting. The remaining variants are
/// per-event failures: the source reports them and keeps running.
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Invalid sentinel configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File system event error: {details}")]
    EventError { details: String },
}

impl SentinelError {
    /// True for failures that prevent a source from running at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SentinelError::InvalidConfig { .. }
                | SentinelError::InitFailed { .. }
                | SentinelError::PathWatchFailed { .. }
        )
    }
}

impl From<notify::Error> for SentinelError {
    fn from(e: notify::Error) -> Self {
        SentinelError::EventError {
            details: e.to_string(),
        }
    }
}
