//! Error types for schedule synchronization
//!
//! Provides error handling for:
//! - Malformed schedule documents
//! - Out-of-range progress and missing task ids
//! - Missing works and activities
//! - Initialization guard violations
//! - Storage failures, primary and derivative

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wpt_schedule::ScheduleError;
use wpt_store::{ActivityId, StoreError, WorkId};

/// Main synchronization error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Schedule JSON has the wrong shape
    #[error("malformed schedule: {0}")]
    MalformedSchedule(#[from] ScheduleError),

    /// Input failed validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Work does not exist
    #[error("work not found: {0}")]
    WorkNotFound(WorkId),

    /// Activity does not exist (or belongs to another work)
    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),

    /// Work exists but has no schedule to project
    #[error("no schedule saved for work {0}")]
    ScheduleMissing(WorkId),

    /// Activities already exist for the work
    #[error("activities already initialized for work {work_id} ({count} rows)")]
    AlreadyInitialized { work_id: WorkId, count: usize },

    /// Storage failure
    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for SyncError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::WorkNotFound(id) => Self::WorkNotFound(id),
            StoreError::ActivityNotFound(id) => Self::ActivityNotFound(id),
            other => Self::Persistence(other),
        }
    }
}

impl SyncError {
    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Classify into the caller-facing kind
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedSchedule(_) => ErrorKind::MalformedSchedule,
            Self::Validation(_) => ErrorKind::Validation,
            Self::WorkNotFound(_) | Self::ActivityNotFound(_) | Self::ScheduleMissing(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyInitialized { .. } => ErrorKind::AlreadyInitialized,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

/// Caller-facing error classification
///
/// `PartialSyncFailure` only appears on warnings, never as a failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MalformedSchedule,
    Validation,
    NotFound,
    AlreadyInitialized,
    Persistence,
    PartialSyncFailure,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
