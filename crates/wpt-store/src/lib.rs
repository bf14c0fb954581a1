//! WPT Store
//!
//! Persistence for works and their activity rows.
//!
//! - [`WorkStore`]: the async persistence interface the reconciliation core consumes
//! - [`MemoryStore`]: in-process adapter, used by tests and short-lived tools
//! - [`SqliteStore`]: SQLite adapter used by the operator console
//!
//! Scope filtering by role happens before a `WorkId` reaches this crate; every
//! call here assumes the caller is already authorized for the work.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod memory;
pub mod schema;
mod sqlite;
mod store;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::WorkStore;
pub use types::{
    Activity, ActivityId, ActivityPatch, NewActivity, NewWork, WorkId, WorkPatch, WorkRecord,
};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by store adapters
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Work does not exist
    #[error("work not found: {0}")]
    WorkNotFound(WorkId),

    /// Activity does not exist
    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),

    /// SQLite failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be read back
    #[error("invalid stored value: {0}")]
    Corrupt(String),

    /// Backend unreachable or refused the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }

    /// Whether the error means the addressed row is missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::WorkNotFound(_) | Self::ActivityNotFound(_))
    }
}
