//! Testing utilities for WPT workspace
//!
//! Shared fixtures and a store wrapper that counts calls and injects faults.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use wpt_store::{
    Activity, ActivityId, ActivityPatch, MemoryStore, NewActivity, NewWork, StoreError,
    StoreResult, WorkId, WorkPatch, WorkRecord, WorkStore,
};

/// Three-level schedule: one project, two tasks, one subtask
pub const SAMPLE_SCHEDULE: &str = r#"{
  "data": [
    {"id": 1, "text": "Foundation", "type": "project", "progress": 0.4, "start_date": "2024-04-01", "duration": 20, "parent": 0},
    {"id": 2, "text": "Excavation", "progress": 1, "start_date": "2024-04-01", "duration": 5, "parent": 1},
    {"id": 3, "text": "Footings", "progress": 0.25, "start_date": "2024-04-06", "duration": 15, "parent": 1},
    {"id": "3.1", "text": "Rebar", "progress": 0.5, "parent": 3}
  ],
  "links": [{"id": 1, "source": 2, "target": 3, "type": "0"}]
}"#;

/// Task object
pub fn task(id: impl Into<Value>, text: &str, progress: f64) -> Value {
    json!({"id": id.into(), "text": text, "progress": progress})
}

/// Current-shape document around `tasks`
pub fn gantt_json(tasks: Vec<Value>) -> String {
    json!({ "data": tasks }).to_string()
}

/// Legacy-shape document around `tasks`
pub fn legacy_json(tasks: Vec<Value>) -> String {
    json!({ "customTasks": tasks }).to_string()
}

/// Insert a work with a fixed id
pub async fn seed_work(store: &dyn WorkStore, id: i64, name: &str) -> WorkRecord {
    store
        .insert_work(NewWork::named(name).with_id(WorkId(id)))
        .await
        .unwrap()
}

/// Insert a work that already has a stored schedule
pub async fn seed_work_with_schedule(
    store: &dyn WorkStore,
    id: i64,
    name: &str,
    raw: &str,
) -> WorkRecord {
    store
        .insert_work(NewWork::named(name).with_id(WorkId(id)).with_schedule(raw))
        .await
        .unwrap()
}

/// Store method, for counting and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    GetWork,
    InsertWork,
    UpdateWork,
    ListWorksWithSchedule,
    ListActivities,
    GetActivity,
    InsertActivities,
    UpdateActivity,
    DeleteActivities,
}

/// Store wrapper that records calls and fails on demand
#[derive(Debug)]
pub struct RecordingStore {
    inner: Arc<dyn WorkStore>,
    calls: Mutex<HashMap<StoreCall, usize>>,
    faults: Mutex<HashSet<StoreCall>>,
}

impl RecordingStore {
    /// Wrap a store
    pub fn new(inner: Arc<dyn WorkStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
            faults: Mutex::new(HashSet::new()),
        }
    }

    /// Wrap a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Make `call` fail until healed
    pub fn fail(&self, call: StoreCall) {
        self.faults.lock().insert(call);
    }

    /// Stop failing `call`
    pub fn heal(&self, call: StoreCall) {
        self.faults.lock().remove(&call);
    }

    /// Times `call` was attempted
    pub fn calls(&self, call: StoreCall) -> usize {
        self.calls.lock().get(&call).copied().unwrap_or(0)
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: StoreCall) -> StoreResult<()> {
        *self.calls.lock().entry(call).or_insert(0) += 1;
        if self.faults.lock().contains(&call) {
            return Err(StoreError::unavailable(format!("injected fault: {call:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkStore for RecordingStore {
    async fn get_work(&self, id: WorkId) -> StoreResult<Option<WorkRecord>> {
        self.record(StoreCall::GetWork)?;
        self.inner.get_work(id).await
    }

    async fn insert_work(&self, work: NewWork) -> StoreResult<WorkRecord> {
        self.record(StoreCall::InsertWork)?;
        self.inner.insert_work(work).await
    }

    async fn update_work(&self, id: WorkId, patch: WorkPatch) -> StoreResult<WorkRecord> {
        self.record(StoreCall::UpdateWork)?;
        self.inner.update_work(id, patch).await
    }

    async fn list_works_with_schedule(&self) -> StoreResult<Vec<WorkId>> {
        self.record(StoreCall::ListWorksWithSchedule)?;
        self.inner.list_works_with_schedule().await
    }

    async fn list_activities(&self, work_id: WorkId) -> StoreResult<Vec<Activity>> {
        self.record(StoreCall::ListActivities)?;
        self.inner.list_activities(work_id).await
    }

    async fn get_activity(&self, id: ActivityId) -> StoreResult<Option<Activity>> {
        self.record(StoreCall::GetActivity)?;
        self.inner.get_activity(id).await
    }

    async fn insert_activities(&self, rows: Vec<NewActivity>) -> StoreResult<Vec<Activity>> {
        self.record(StoreCall::InsertActivities)?;
        self.inner.insert_activities(rows).await
    }

    async fn update_activity(
        &self,
        id: ActivityId,
        patch: ActivityPatch,
    ) -> StoreResult<Activity> {
        self.record(StoreCall::UpdateActivity)?;
        self.inner.update_activity(id, patch).await
    }

    async fn delete_activities(&self, work_id: WorkId) -> StoreResult<usize> {
        self.record(StoreCall::DeleteActivities)?;
        self.inner.delete_activities(work_id).await
    }
}
