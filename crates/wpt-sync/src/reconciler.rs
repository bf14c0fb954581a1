//! Progress reconciliation
//!
//! Pushes activity-level progress into the schedule document so the chart
//! editor never shows stale completion. The document is matched to activity
//! rows through `activity_code == String(task.id)`.

use crate::scale::{fraction_to_percentage, percentage_to_fraction};
use serde::Serialize;
use std::collections::HashMap;
use wpt_schedule::ScheduleDocument;
use wpt_store::Activity;

/// Reconciled document plus how many tasks were matched
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub document: ScheduleDocument,
    pub matched: usize,
}

fn index_by_code(activities: &[Activity]) -> HashMap<&str, &Activity> {
    let mut by_code = HashMap::with_capacity(activities.len());
    for activity in activities {
        by_code
            .entry(activity.activity_code.as_str())
            .or_insert(activity);
    }
    by_code
}

/// Rewrite task progress from activity rows
///
/// Tasks without a matching activity pass through unchanged. The result is
/// always `data`-shaped, other top-level fields preserved.
#[must_use]
pub fn reconcile(document: ScheduleDocument, activities: &[Activity]) -> Reconciled {
    let by_code = index_by_code(activities);
    let mut matched = 0;

    let tasks = document
        .tasks()
        .iter()
        .cloned()
        .map(|mut task| {
            let activity = task.key().and_then(|key| by_code.get(key.as_str()).copied());
            if let Some(activity) = activity {
                task.set_progress(percentage_to_fraction(activity.progress_percentage));
                matched += 1;
            }
            task
        })
        .collect();

    Reconciled {
        document: document.with_tasks(tasks),
        matched,
    }
}

/// Push activity progress into the document
#[must_use]
pub fn push_activity_progress_into_document(
    document: ScheduleDocument,
    activities: &[Activity],
) -> ScheduleDocument {
    reconcile(document, activities).document
}

/// Document as it should be shown on load
///
/// Reconciled when the work has activities, returned untouched otherwise.
#[must_use]
pub fn apply_on_load(document: ScheduleDocument, activities: &[Activity]) -> ScheduleDocument {
    if activities.is_empty() {
        document
    } else {
        push_activity_progress_into_document(document, activities)
    }
}

/// Task whose document progress disagrees with its activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
    pub activity_code: String,
    /// Document progress as a percentage, `None` if unset
    pub document_percentage: Option<f64>,
    pub activity_percentage: f64,
}

/// Tasks violating `progress_percentage == progress * 100`
#[must_use]
pub fn diverged_tasks(document: &ScheduleDocument, activities: &[Activity]) -> Vec<Divergence> {
    let by_code = index_by_code(activities);

    document
        .tasks()
        .iter()
        .filter_map(|task| {
            let code = task.key()?;
            let activity = by_code.get(code.as_str())?;
            let document_percentage = task.progress().map(fraction_to_percentage);
            let agrees = (document_percentage.unwrap_or(0.0) - activity.progress_percentage)
                .abs()
                < 1e-6;
            (!agrees).then(|| Divergence {
                activity_code: code,
                document_percentage,
                activity_percentage: activity.progress_percentage,
            })
        })
        .collect()
}

/// Relationship between a work's two stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkSyncState {
    /// No document, no activities
    Uninitialized,
    /// Document saved, no activities yet
    DocumentOnly,
    /// Both exist
    Synchronized,
}

impl WorkSyncState {
    /// Classify from what exists
    ///
    /// Activities without a document count as uninitialized: there is nothing
    /// to reconcile them against.
    #[must_use]
    pub fn classify(has_document: bool, activity_count: usize) -> Self {
        match (has_document, activity_count) {
            (false, _) => Self::Uninitialized,
            (true, 0) => Self::DocumentOnly,
            (true, _) => Self::Synchronized,
        }
    }
}
