//! WPT Schedule Synchronization
//!
//! Keeps two representations of a work's progress consistent: the Gantt
//! schedule document and the normalized activity rows derived from it.
//!
//! # Flow
//!
//! ```text
//! save_schedule:             document ──project──▶ activities   (document wins on structure)
//! update_activity_progress:  activities ──reconcile──▶ document (activities win on progress)
//! ```
//!
//! # Core Components
//!
//! - [`projector`]: tasks to activity rows, then parent resolution
//! - [`reconciler`]: activity progress back into the document
//! - [`ScheduleSynchronizer`]: ordering, persistence, cache invalidation
//! - [`rollup`]: duration-weighted progress summary
//! - [`ViewCache`]: injectable TTL cache for loaded views
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wpt_store::{MemoryStore, WorkId};
//! use wpt_sync::{ScheduleSynchronizer, SyncConfig};
//!
//! let sync = ScheduleSynchronizer::from_config(Arc::new(MemoryStore::new()), SyncConfig::default());
//! let saved = sync
//!     .save_schedule(WorkId(42), r#"{"data":[{"id":1,"text":"Foundation","progress":0.4}]}"#)
//!     .await;
//! assert!(saved.success);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod projector;
pub mod reconciler;
pub mod result;
pub mod rollup;
pub mod scale;

pub use cache::{CachedView, MokaViewCache, NoopCache, ViewCache, ViewKey};
pub use config::{CacheConfig, SyncConfig};
pub use error::{ConfigError, ErrorKind, SyncError};
pub use orchestrator::{
    BatchReport, BulkUpdateReport, DocumentSync, InitReport, Inspection, ProgressEntry,
    ProgressUpdate, SaveReport, ScheduleSynchronizer, SkippedUpdate, WorkFailure,
};
pub use reconciler::{Divergence, WorkSyncState};
pub use result::{OperationResult, SyncWarning};
pub use rollup::{MainActivitySummary, ProgressSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the synchronizer
    pub use crate::config::SyncConfig;
    pub use crate::error::{ErrorKind, SyncError};
    pub use crate::orchestrator::{ProgressEntry, ScheduleSynchronizer};
    pub use crate::result::OperationResult;
    pub use wpt_schedule::ScheduleDocument;
    pub use wpt_store::{ActivityId, WorkId, WorkStore};
}
