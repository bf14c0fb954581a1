//! The persistence interface

use crate::types::{
    Activity, ActivityId, ActivityPatch, NewActivity, NewWork, WorkId, WorkPatch, WorkRecord,
};
use crate::StoreResult;
use async_trait::async_trait;

/// Persistence for works and activities
///
/// Implementations give no cross-call atomicity. A reader running between
/// [`WorkStore::delete_activities`] and [`WorkStore::insert_activities`] may
/// see a work with zero activities.
#[async_trait]
pub trait WorkStore: Send + Sync + std::fmt::Debug {
    /// Fetch a work
    async fn get_work(&self, id: WorkId) -> StoreResult<Option<WorkRecord>>;

    /// Insert a work
    async fn insert_work(&self, work: NewWork) -> StoreResult<WorkRecord>;

    /// Apply a patch; fails with [`crate::StoreError::WorkNotFound`] if missing
    async fn update_work(&self, id: WorkId, patch: WorkPatch) -> StoreResult<WorkRecord>;

    /// Ids of works with a non-blank schedule, ascending
    async fn list_works_with_schedule(&self) -> StoreResult<Vec<WorkId>>;

    /// Activities of a work, ordered by `display_order`
    async fn list_activities(&self, work_id: WorkId) -> StoreResult<Vec<Activity>>;

    /// Fetch one activity
    async fn get_activity(&self, id: ActivityId) -> StoreResult<Option<Activity>>;

    /// Insert rows, returning them with assigned ids in input order
    async fn insert_activities(&self, rows: Vec<NewActivity>) -> StoreResult<Vec<Activity>>;

    /// Apply a patch; fails with [`crate::StoreError::ActivityNotFound`] if missing
    async fn update_activity(&self, id: ActivityId, patch: ActivityPatch)
        -> StoreResult<Activity>;

    /// Delete every activity of a work, returning how many went
    async fn delete_activities(&self, work_id: WorkId) -> StoreResult<usize>;
}
