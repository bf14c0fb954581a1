//! WPT Schedule Codec
//!
//! Reads and writes the Gantt schedule document persisted for each work.
//!
//! # Core Concepts
//!
//! - [`ScheduleDocument`]: a decoded document, its shape resolved once at decode time
//! - [`DocumentShape`]: the current `data` form or the legacy `customTasks` form
//! - [`ScheduleTask`]: one task, kept as its raw JSON object so unknown fields survive rewrites
//!
//! # Example
//!
//! ```rust,ignore
//! use wpt_schedule::{decode, encode};
//!
//! let doc = decode(Some(r#"{"data":[{"id":1,"text":"Foundation","progress":0.4}]}"#))?
//!     .expect("non-empty input");
//! assert_eq!(doc.tasks()[0].key().as_deref(), Some("1"));
//! let raw = encode(&doc)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod error;
mod task;

pub use document::{DocumentShape, ScheduleDocument, DATA_KEY, LEGACY_TASKS_KEY};
pub use error::ScheduleError;
pub use task::{stringify_id, ScheduleTask, TaskKind};

/// Decode a persisted schedule string
///
/// Returns `Ok(None)` when nothing was ever saved (null, empty or blank input).
///
/// # Errors
/// [`ScheduleError`] when the input is not JSON or has no task list.
pub fn decode(raw: Option<&str>) -> Result<Option<ScheduleDocument>, ScheduleError> {
    ScheduleDocument::decode(raw)
}

/// Serialize a document back to its JSON string
///
/// # Errors
/// [`ScheduleError::Serialize`] if serialization fails.
pub fn encode(doc: &ScheduleDocument) -> Result<String, ScheduleError> {
    doc.encode()
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
