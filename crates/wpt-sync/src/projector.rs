//! Activity projection
//!
//! Derives activity rows from a schedule's task list in two passes:
//! 1. [`project`] builds one [`NewActivity`] per task, in array order
//! 2. [`resolve_parents`] maps `parent` references onto surrogate ids once the
//!    rows are inserted and their ids are known

use crate::error::SyncError;
use crate::scale::fraction_to_percentage;
use std::collections::HashMap;
use wpt_schedule::ScheduleTask;
use wpt_store::{Activity, ActivityId, NewActivity, WorkId};

/// Result of the first pass
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Task list was empty; nothing to insert
    Empty,
    /// Rows to insert, in display order
    Rows(Vec<NewActivity>),
}

impl Projection {
    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Rows(rows) => rows.len(),
        }
    }

    /// Whether nothing was projected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Project tasks into activity rows
///
/// # Errors
/// [`SyncError::Validation`] if a task has no usable `id`, or the list is too
/// long to number.
pub fn project(work_id: WorkId, tasks: &[ScheduleTask]) -> Result<Projection, SyncError> {
    if tasks.is_empty() {
        return Ok(Projection::Empty);
    }

    let rows = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| project_task(work_id, index, task))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Projection::Rows(rows))
}

fn project_task(
    work_id: WorkId,
    index: usize,
    task: &ScheduleTask,
) -> Result<NewActivity, SyncError> {
    let activity_code = task
        .key()
        .ok_or_else(|| SyncError::validation(format!("task at index {index} has no id")))?;
    let display_order = u32::try_from(index)
        .map_err(|_| SyncError::validation(format!("task index {index} out of range")))?;

    Ok(NewActivity {
        work_id,
        activity_code,
        activity_name: task.text().unwrap_or_default().to_string(),
        is_main_activity: task.is_main_activity(),
        start_date: task.start_date(),
        end_date: task.end_date(),
        duration: task.duration(),
        progress_percentage: fraction_to_percentage(task.progress().unwrap_or(0.0)),
        display_order,
    })
}

/// Child to parent link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub child: ActivityId,
    pub parent: ActivityId,
}

/// Result of the second pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentResolution {
    /// Links to write
    pub links: Vec<ParentLink>,
    /// `parent` references with no matching row on either end
    pub unresolved: usize,
}

/// Resolve `parent` references against freshly inserted rows
///
/// Lookups go by `activity_code`; with duplicate codes the first row wins.
/// A reference whose child or parent row is missing is skipped and counted.
#[must_use]
pub fn resolve_parents(tasks: &[ScheduleTask], inserted: &[Activity]) -> ParentResolution {
    let mut by_code: HashMap<&str, ActivityId> = HashMap::with_capacity(inserted.len());
    for activity in inserted {
        by_code
            .entry(activity.activity_code.as_str())
            .or_insert(activity.id);
    }

    let mut resolution = ParentResolution::default();
    for task in tasks {
        let Some(parent_key) = task.parent_key() else {
            continue;
        };
        let child = task.key().and_then(|key| by_code.get(key.as_str()).copied());
        let parent = by_code.get(parent_key.as_str()).copied();

        match (child, parent) {
            (Some(child), Some(parent)) if child != parent => {
                resolution.links.push(ParentLink { child, parent });
            }
            _ => resolution.unresolved += 1,
        }
    }
    resolution
}
