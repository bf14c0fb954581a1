//! In-memory store

use crate::store::WorkStore;
use crate::types::{
    Activity, ActivityId, ActivityPatch, NewActivity, NewWork, WorkId, WorkPatch, WorkRecord,
};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    works: BTreeMap<WorkId, WorkRecord>,
    activities: BTreeMap<ActivityId, Activity>,
    next_work_id: i64,
    next_activity_id: i64,
}

/// Store backed by process memory
///
/// State lives as long as the value; clones of an `Arc<MemoryStore>` share it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored activities across all works
    #[must_use]
    pub fn activity_count(&self) -> usize {
        self.state.read().activities.len()
    }
}

#[async_trait]
impl WorkStore for MemoryStore {
    async fn get_work(&self, id: WorkId) -> StoreResult<Option<WorkRecord>> {
        Ok(self.state.read().works.get(&id).cloned())
    }

    async fn insert_work(&self, work: NewWork) -> StoreResult<WorkRecord> {
        let mut state = self.state.write();
        let id = match work.id {
            Some(id) => {
                if state.works.contains_key(&id) {
                    return Err(StoreError::unavailable(format!("work {id} already exists")));
                }
                id
            }
            None => WorkId(state.next_work_id.max(1)),
        };
        state.next_work_id = state.next_work_id.max(id.0 + 1);

        let now = Utc::now();
        let record = WorkRecord {
            id,
            name: work.name,
            schedule_data: work.schedule_data,
            created_at: now,
            updated_at: now,
        };
        state.works.insert(id, record.clone());
        Ok(record)
    }

    async fn update_work(&self, id: WorkId, patch: WorkPatch) -> StoreResult<WorkRecord> {
        let mut state = self.state.write();
        let work = state.works.get_mut(&id).ok_or(StoreError::WorkNotFound(id))?;
        if let Some(name) = patch.name {
            work.name = name;
        }
        if let Some(schedule_data) = patch.schedule_data {
            work.schedule_data = schedule_data;
        }
        work.updated_at = Utc::now();
        Ok(work.clone())
    }

    async fn list_works_with_schedule(&self) -> StoreResult<Vec<WorkId>> {
        Ok(self
            .state
            .read()
            .works
            .values()
            .filter(|w| w.has_schedule())
            .map(|w| w.id)
            .collect())
    }

    async fn list_activities(&self, work_id: WorkId) -> StoreResult<Vec<Activity>> {
        let state = self.state.read();
        let mut rows: Vec<Activity> = state
            .activities
            .values()
            .filter(|a| a.work_id == work_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.display_order, a.id));
        Ok(rows)
    }

    async fn get_activity(&self, id: ActivityId) -> StoreResult<Option<Activity>> {
        Ok(self.state.read().activities.get(&id).cloned())
    }

    async fn insert_activities(&self, rows: Vec<NewActivity>) -> StoreResult<Vec<Activity>> {
        let mut state = self.state.write();
        if let Some(missing) = rows
            .iter()
            .map(|r| r.work_id)
            .find(|id| !state.works.contains_key(id))
        {
            return Err(StoreError::WorkNotFound(missing));
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            state.next_activity_id += 1;
            let activity = row.into_activity(ActivityId(state.next_activity_id), now);
            state.activities.insert(activity.id, activity.clone());
            inserted.push(activity);
        }
        Ok(inserted)
    }

    async fn update_activity(
        &self,
        id: ActivityId,
        patch: ActivityPatch,
    ) -> StoreResult<Activity> {
        let mut state = self.state.write();
        let activity = state
            .activities
            .get_mut(&id)
            .ok_or(StoreError::ActivityNotFound(id))?;
        patch.apply(activity, Utc::now());
        Ok(activity.clone())
    }

    async fn delete_activities(&self, work_id: WorkId) -> StoreResult<usize> {
        let mut state = self.state.write();
        let before = state.activities.len();
        state.activities.retain(|_, a| a.work_id != work_id);
        Ok(before - state.activities.len())
    }
}
