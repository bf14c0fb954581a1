//! Work and activity records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Work identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkId(pub i64);

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate activity identifier
///
/// Not stable across rebuilds: every schedule save deletes and reinserts rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub i64);

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub id: WorkId,
    pub name: String,
    /// Raw schedule document JSON, `None` until first saved
    pub schedule_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkRecord {
    /// Whether a non-blank schedule is stored
    #[inline]
    #[must_use]
    pub fn has_schedule(&self) -> bool {
        self.schedule_data
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty())
    }
}

/// Work to insert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWork {
    /// Explicit id; the store assigns one when `None`
    pub id: Option<WorkId>,
    pub name: String,
    pub schedule_data: Option<String>,
}

impl NewWork {
    /// Work with a name and no schedule
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: WorkId) -> Self {
        self.id = Some(id);
        self
    }

    /// With stored schedule
    #[inline]
    #[must_use]
    pub fn with_schedule(mut self, raw: impl Into<String>) -> Self {
        self.schedule_data = Some(raw.into());
        self
    }
}

/// Field changes for a work; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkPatch {
    pub name: Option<String>,
    pub schedule_data: Option<Option<String>>,
}

impl WorkPatch {
    /// Replace the stored schedule
    #[must_use]
    pub fn schedule(raw: Option<String>) -> Self {
        Self {
            schedule_data: Some(raw),
            ..Self::default()
        }
    }
}

/// Stored activity row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub work_id: WorkId,
    /// Stringified schedule task id
    pub activity_code: String,
    pub activity_name: String,
    pub parent_activity_id: Option<ActivityId>,
    pub is_main_activity: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<f64>,
    /// Completion in `[0, 100]`
    pub progress_percentage: f64,
    /// Position in the originating task array
    pub display_order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Activity row before insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub work_id: WorkId,
    pub activity_code: String,
    pub activity_name: String,
    pub is_main_activity: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<f64>,
    pub progress_percentage: f64,
    pub display_order: u32,
}

impl NewActivity {
    /// Materialize with an assigned id
    #[must_use]
    pub fn into_activity(self, id: ActivityId, now: DateTime<Utc>) -> Activity {
        Activity {
            id,
            work_id: self.work_id,
            activity_code: self.activity_code,
            activity_name: self.activity_name,
            parent_activity_id: None,
            is_main_activity: self.is_main_activity,
            start_date: self.start_date,
            end_date: self.end_date,
            duration: self.duration,
            progress_percentage: self.progress_percentage,
            display_order: self.display_order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field changes for an activity; `None` leaves a field alone
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityPatch {
    pub progress_percentage: Option<f64>,
    pub parent_activity_id: Option<Option<ActivityId>>,
}

impl ActivityPatch {
    /// Set progress
    #[must_use]
    pub fn progress(percentage: f64) -> Self {
        Self {
            progress_percentage: Some(percentage),
            ..Self::default()
        }
    }

    /// Set parent link
    #[must_use]
    pub fn parent(parent: Option<ActivityId>) -> Self {
        Self {
            parent_activity_id: Some(parent),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.progress_percentage.is_none() && self.parent_activity_id.is_none()
    }

    pub(crate) fn apply(&self, activity: &mut Activity, now: DateTime<Utc>) {
        if let Some(progress) = self.progress_percentage {
            activity.progress_percentage = progress;
        }
        if let Some(parent) = self.parent_activity_id {
            activity.parent_activity_id = parent;
        }
        activity.updated_at = now;
    }
}
