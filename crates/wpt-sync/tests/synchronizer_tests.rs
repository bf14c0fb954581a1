use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use wpt_schedule::ScheduleDocument;
use wpt_store::{ActivityId, ActivityPatch, MemoryStore, WorkId, WorkPatch, WorkStore};
use wpt_sync::{
    DocumentSync, ErrorKind, ProgressEntry, ScheduleSynchronizer, SyncConfig, WorkSyncState,
};
use wpt_test_utils::{
    gantt_json, legacy_json, seed_work, seed_work_with_schedule, task, RecordingStore, StoreCall,
    SAMPLE_SCHEDULE,
};

const FOUNDATION: &str =
    r#"{"data":[{"id":1,"text":"Foundation","progress":0.4,"type":"project"}]}"#;

fn synchronizer(store: Arc<dyn WorkStore>) -> ScheduleSynchronizer {
    ScheduleSynchronizer::from_config(store, SyncConfig::default())
}

async fn stored_document(store: &dyn WorkStore, id: i64) -> Value {
    let work = store.get_work(WorkId(id)).await.unwrap().unwrap();
    serde_json::from_str(work.schedule_data.as_deref().unwrap()).unwrap()
}

async fn activity_id(store: &dyn WorkStore, work: i64, code: &str) -> ActivityId {
    store
        .list_activities(WorkId(work))
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.activity_code == code)
        .map(|a| a.id)
        .unwrap()
}

#[tokio::test]
async fn test_save_projects_foundation_row() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 42, "Bridge").await;
    let sync = synchronizer(store.clone());

    let saved = sync.save_schedule(WorkId(42), FOUNDATION).await;
    assert!(saved.success);
    assert!(!saved.has_warning());
    let report = saved.data.unwrap();
    assert_eq!(report.task_count, 1);
    assert_eq!(report.activities.map(|a| a.activities_created), Some(1));

    let rows = store.list_activities(WorkId(42)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].activity_code, "1");
    assert_eq!(rows[0].activity_name, "Foundation");
    assert_eq!(rows[0].progress_percentage, 40.0);
    assert!(rows[0].is_main_activity);
    assert_eq!(rows[0].display_order, 0);
}

#[tokio::test]
async fn test_update_progress_rewrites_document() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 42, "Bridge").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(42), FOUNDATION).await.success);

    let id = activity_id(store.as_ref(), 42, "1").await;
    let updated = sync.update_activity_progress(id, 75.0, WorkId(42)).await;
    assert!(updated.success);
    let update = updated.data.unwrap();
    assert_eq!(update.activity.progress_percentage, 75.0);
    assert_eq!(
        update.document,
        Some(DocumentSync::Rewritten { tasks_updated: 1 })
    );

    assert_eq!(
        stored_document(store.as_ref(), 42).await,
        json!({"data": [{"id": 1, "text": "Foundation", "progress": 0.75, "type": "project"}]})
    );
}

#[tokio::test]
async fn test_bulk_update_skips_unknown_and_syncs_once() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 42, "Bridge").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(42), FOUNDATION).await.success);

    store.reset_calls();
    let result = sync
        .bulk_update_activities_progress(
            WorkId(42),
            &[ProgressEntry::new("1", 60.0), ProgressEntry::new("999", 10.0)],
        )
        .await;

    assert!(result.success);
    let report = result.data.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].activity_code, "999");
    assert_eq!(store.calls(StoreCall::UpdateWork), 1);

    let rows = store.list_activities(WorkId(42)).await.unwrap();
    assert_eq!(rows[0].progress_percentage, 60.0);
    assert_eq!(
        stored_document(store.as_ref(), 42).await["data"][0]["progress"],
        json!(0.6)
    );
}

#[tokio::test]
async fn test_bulk_update_rejects_out_of_range_entry() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 1, "Road").await;
    let sync = synchronizer(store.clone());
    let raw = gantt_json(vec![task(1, "A", 0.0), task(2, "B", 0.0)]);
    assert!(sync.save_schedule(WorkId(1), &raw).await.success);

    store.reset_calls();
    let report = sync
        .bulk_update_activities_progress(
            WorkId(1),
            &[ProgressEntry::new("1", 101.0), ProgressEntry::new("2", 30.0)],
        )
        .await
        .data
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped[0].activity_code, "1");
    assert_eq!(store.calls(StoreCall::UpdateActivity), 1);
}

#[tokio::test]
async fn test_bulk_update_with_no_matches_leaves_document_alone() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 1, "Road").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);

    store.reset_calls();
    let report = sync
        .bulk_update_activities_progress(WorkId(1), &[ProgressEntry::new("x", 5.0)])
        .await
        .data
        .unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(report.document, None);
    assert_eq!(store.calls(StoreCall::UpdateWork), 0);
}

#[tokio::test]
async fn test_initialize_twice_is_guarded() {
    let store = Arc::new(MemoryStore::new());
    seed_work_with_schedule(store.as_ref(), 5, "Canal", SAMPLE_SCHEDULE).await;
    let sync = synchronizer(store.clone());

    let first = sync.initialize_activities_from_schedule(WorkId(5)).await;
    assert!(first.success);
    assert_eq!(first.data.unwrap().activities_created, 4);
    let before = store.list_activities(WorkId(5)).await.unwrap();

    let second = sync.initialize_activities_from_schedule(WorkId(5)).await;
    assert!(!second.success);
    assert_eq!(second.error_kind, Some(ErrorKind::AlreadyInitialized));
    assert_eq!(store.list_activities(WorkId(5)).await.unwrap(), before);
}

#[tokio::test]
async fn test_initialize_requires_work_and_document() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Empty").await;
    let sync = synchronizer(store);

    let missing_work = sync.initialize_activities_from_schedule(WorkId(99)).await;
    assert_eq!(missing_work.error_kind, Some(ErrorKind::NotFound));

    let missing_doc = sync.initialize_activities_from_schedule(WorkId(1)).await;
    assert_eq!(missing_doc.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_initialize_empty_schedule_creates_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_work_with_schedule(store.as_ref(), 1, "Empty", r#"{"data":[]}"#).await;
    let sync = synchronizer(store);

    let result = sync.initialize_activities_from_schedule(WorkId(1)).await;
    assert!(result.success);
    assert_eq!(result.data.unwrap().activities_created, 0);
}

#[tokio::test]
async fn test_save_links_parents() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Dam").await;
    let sync = synchronizer(store.clone());

    let raw = r#"{"data":[{"id":"1","parent":null},{"id":"2","parent":"1"}]}"#;
    let report = sync.save_schedule(WorkId(1), raw).await.data.unwrap();
    assert_eq!(report.activities.map(|a| a.parents_linked), Some(1));

    let rows = store.list_activities(WorkId(1)).await.unwrap();
    assert_eq!(rows[0].parent_activity_id, None);
    assert_eq!(rows[1].parent_activity_id, Some(rows[0].id));
}

#[tokio::test]
async fn test_failed_projection_keeps_saved_document() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 1, "Tunnel").await;
    let sync = synchronizer(store.clone());

    store.fail(StoreCall::InsertActivities);
    let raw = gantt_json(vec![task(1, "Boring", 0.1)]);
    let saved = sync.save_schedule(WorkId(1), &raw).await;

    assert!(saved.success);
    assert_eq!(
        saved.warning.as_ref().map(|w| w.kind),
        Some(ErrorKind::PartialSyncFailure)
    );
    assert_eq!(saved.data.unwrap().activities, None);

    let work = store.get_work(WorkId(1)).await.unwrap().unwrap();
    assert_eq!(work.schedule_data.as_deref(), Some(raw.as_str()));

    store.heal(StoreCall::InsertActivities);
    let repaired = sync.reinitialize_activities(WorkId(1)).await;
    assert_eq!(repaired.data.unwrap().activities_created, 1);
}

#[tokio::test]
async fn test_malformed_schedule_saved_with_warning() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);
    let before = store.list_activities(WorkId(1)).await.unwrap();

    for raw in [
        "{not json",
        r#"{"links":[]}"#,
        "[1,2]",
        r#"{"data":[{"id":1},null]}"#,
    ] {
        store.reset_calls();
        let result = sync.save_schedule(WorkId(1), raw).await;
        assert!(result.success, "{raw} rejected");
        assert_eq!(
            result.warning.as_ref().map(|w| w.kind),
            Some(ErrorKind::PartialSyncFailure)
        );
        assert_eq!(result.data.unwrap().activities, None);

        assert_eq!(store.calls(StoreCall::UpdateWork), 1);
        assert_eq!(store.calls(StoreCall::DeleteActivities), 0);
        let work = store.get_work(WorkId(1)).await.unwrap().unwrap();
        assert_eq!(work.schedule_data.as_deref(), Some(raw));
    }

    assert_eq!(store.list_activities(WorkId(1)).await.unwrap(), before);
}

#[tokio::test]
async fn test_malformed_save_drops_cached_schedule() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);
    assert!(sync.load_schedule(WorkId(1)).await.success);

    assert!(sync.save_schedule(WorkId(1), r#"{"links":[]}"#).await.has_warning());

    let loaded = sync.load_schedule(WorkId(1)).await;
    assert!(!loaded.success);
    assert_eq!(loaded.error_kind, Some(ErrorKind::MalformedSchedule));
}

#[tokio::test]
async fn test_primary_write_failure_aborts_save() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());

    store.fail(StoreCall::UpdateWork);
    let result = sync.save_schedule(WorkId(1), FOUNDATION).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Persistence));
    assert_eq!(store.calls(StoreCall::InsertActivities), 0);
}

#[tokio::test]
async fn test_save_unknown_work_is_not_found() {
    let sync = synchronizer(Arc::new(MemoryStore::new()));
    let result = sync.save_schedule(WorkId(404), FOUNDATION).await;
    assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_blank_save_clears_document_only() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);

    let cleared = sync.save_schedule(WorkId(1), "  ").await;
    assert!(cleared.success);
    assert_eq!(cleared.data.unwrap().task_count, 0);

    let work = store.get_work(WorkId(1)).await.unwrap().unwrap();
    assert_eq!(work.schedule_data, None);
    assert_eq!(store.list_activities(WorkId(1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_resave_replaces_activities() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), SAMPLE_SCHEDULE).await.success);
    let old_ids: Vec<_> = store
        .list_activities(WorkId(1))
        .await
        .unwrap()
        .iter()
        .map(|a| a.id)
        .collect();

    let raw = gantt_json(vec![task("a", "Survey", 1.0), task("b", "Permits", 0.0)]);
    assert!(sync.save_schedule(WorkId(1), &raw).await.success);

    let rows = store.list_activities(WorkId(1)).await.unwrap();
    let codes: Vec<_> = rows.iter().map(|a| a.activity_code.as_str()).collect();
    assert_eq!(codes, vec!["a", "b"]);
    assert!(rows.iter().all(|a| !old_ids.contains(&a.id)));
}

#[tokio::test]
async fn test_task_without_id_keeps_existing_activities() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);

    let raw = r#"{"data":[{"text":"no id"}]}"#;
    let saved = sync.save_schedule(WorkId(1), raw).await;
    assert!(saved.success);
    assert!(saved.has_warning());
    assert_eq!(store.list_activities(WorkId(1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_progress_validation() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    seed_work(store.as_ref(), 2, "Quay").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);
    let id = activity_id(store.as_ref(), 1, "1").await;

    for bad in [-1.0, 100.5, f64::NAN] {
        let result = sync.update_activity_progress(id, bad, WorkId(1)).await;
        assert_eq!(result.error_kind, Some(ErrorKind::Validation));
    }

    let missing = sync
        .update_activity_progress(ActivityId(9_999), 10.0, WorkId(1))
        .await;
    assert_eq!(missing.error_kind, Some(ErrorKind::NotFound));

    let other_work = sync.update_activity_progress(id, 10.0, WorkId(2)).await;
    assert_eq!(other_work.error_kind, Some(ErrorKind::NotFound));

    let rows = store.list_activities(WorkId(1)).await.unwrap();
    assert_eq!(rows[0].progress_percentage, 40.0);
}

#[tokio::test]
async fn test_update_progress_survives_document_sync_failure() {
    let store = Arc::new(RecordingStore::in_memory());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);
    let id = activity_id(store.as_ref(), 1, "1").await;

    store.fail(StoreCall::UpdateWork);
    let result = sync.update_activity_progress(id, 90.0, WorkId(1)).await;

    assert!(result.success);
    assert!(result.has_warning());
    let update = result.data.unwrap();
    assert_eq!(update.activity.progress_percentage, 90.0);
    assert_eq!(update.document, None);
}

#[tokio::test]
async fn test_legacy_document_becomes_data_shaped() {
    let store = Arc::new(MemoryStore::new());
    let raw = legacy_json(vec![task(1, "Foundation", 0.2), task(2, "Walls", 0.0)]);
    seed_work_with_schedule(store.as_ref(), 3, "School", &raw).await;
    let sync = synchronizer(store.clone());

    assert!(sync.initialize_activities_from_schedule(WorkId(3)).await.success);
    let id = activity_id(store.as_ref(), 3, "2").await;
    assert!(sync
        .update_activity_progress(id, 50.0, WorkId(3))
        .await
        .success);

    let stored = stored_document(store.as_ref(), 3).await;
    assert_eq!(stored.get("customTasks"), None);
    assert_eq!(
        stored,
        json!({"data": [
            {"id": 1, "text": "Foundation", "progress": 0.2},
            {"id": 2, "text": "Walls", "progress": 0.5}
        ]})
    );
}

#[tokio::test]
async fn test_load_reconciles_against_activities() {
    let store = Arc::new(MemoryStore::new());
    seed_work_with_schedule(store.as_ref(), 1, "Pier", FOUNDATION).await;
    let sync = synchronizer(store.clone());

    let raw = sync.load_schedule(WorkId(1)).await.data.unwrap().unwrap();
    assert_eq!(raw.tasks()[0].progress(), Some(0.4));

    assert!(sync.initialize_activities_from_schedule(WorkId(1)).await.success);
    let id = activity_id(store.as_ref(), 1, "1").await;
    store
        .update_activity(id, ActivityPatch::progress(80.0))
        .await
        .unwrap();

    let disabled = ScheduleSynchronizer::from_config(
        store.clone(),
        SyncConfig::default().with_cache_enabled(false),
    );
    let loaded = disabled.load_schedule(WorkId(1)).await.data.unwrap().unwrap();
    assert_eq!(loaded.tasks()[0].progress(), Some(0.8));
}

#[tokio::test]
async fn test_load_without_document_is_none() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store);

    let loaded = sync.load_schedule(WorkId(1)).await;
    assert!(loaded.success);
    assert_eq!(loaded.data, Some(None));

    let missing = sync.load_schedule(WorkId(2)).await;
    assert_eq!(missing.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_cached_load_invalidated_by_mutation() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), FOUNDATION).await.success);

    let progress = |doc: Option<ScheduleDocument>| doc.and_then(|d| d.tasks()[0].progress());

    assert_eq!(progress(sync.load_schedule(WorkId(1)).await.data.unwrap()), Some(0.4));

    let id = activity_id(store.as_ref(), 1, "1").await;
    store
        .update_activity(id, ActivityPatch::progress(90.0))
        .await
        .unwrap();
    assert_eq!(progress(sync.load_schedule(WorkId(1)).await.data.unwrap()), Some(0.4));

    assert!(sync.sync_document_from_activities(WorkId(1)).await.success);
    assert_eq!(progress(sync.load_schedule(WorkId(1)).await.data.unwrap()), Some(0.9));
}

#[tokio::test]
async fn test_sync_document_no_ops() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    seed_work_with_schedule(store.as_ref(), 2, "Quay", FOUNDATION).await;
    let sync = synchronizer(store);

    assert_eq!(
        sync.sync_document_from_activities(WorkId(1)).await.data,
        Some(DocumentSync::NoDocument)
    );
    assert_eq!(
        sync.sync_document_from_activities(WorkId(2)).await.data,
        Some(DocumentSync::NoActivities)
    );
    assert_eq!(
        sync.sync_document_from_activities(WorkId(3)).await.error_kind,
        Some(ErrorKind::NotFound)
    );
}

#[tokio::test]
async fn test_reinitialize_all_accumulates() {
    let store = Arc::new(MemoryStore::new());
    seed_work_with_schedule(store.as_ref(), 1, "Fresh", FOUNDATION).await;
    seed_work_with_schedule(store.as_ref(), 2, "Done", SAMPLE_SCHEDULE).await;
    seed_work_with_schedule(store.as_ref(), 3, "Broken", "{oops").await;
    seed_work_with_schedule(store.as_ref(), 4, "Empty", r#"{"data":[]}"#).await;
    seed_work(store.as_ref(), 5, "Unscheduled").await;
    let sync = synchronizer(store.clone());
    assert!(sync.initialize_activities_from_schedule(WorkId(2)).await.success);

    let report = sync.reinitialize_all(false).await.data.unwrap();
    assert_eq!(report.processed, 4);
    assert_eq!(report.initialized, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].work_id, WorkId(3));

    let before = store.list_activities(WorkId(2)).await.unwrap();
    let forced = sync.reinitialize_all(true).await.data.unwrap();
    assert_eq!(forced.initialized, 2);
    assert_eq!(forced.cleared, 0);
    assert_eq!(forced.skipped, 1);
    assert_eq!(forced.failed, 1);
    let after = store.list_activities(WorkId(2)).await.unwrap();
    assert_eq!(after.len(), before.len());
    assert_ne!(after[0].id, before[0].id);
}

#[tokio::test]
async fn test_forced_batch_reports_cleared_work() {
    let store = Arc::new(MemoryStore::new());
    seed_work_with_schedule(store.as_ref(), 1, "Culvert", FOUNDATION).await;
    let sync = synchronizer(store.clone());
    assert!(sync.initialize_activities_from_schedule(WorkId(1)).await.success);

    store
        .update_work(WorkId(1), WorkPatch::schedule(Some(r#"{"data":[]}"#.to_string())))
        .await
        .unwrap();

    let report = sync.reinitialize_all(true).await.data.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.initialized, 0);
    assert_eq!(report.cleared, 1);
    assert_eq!(report.skipped, 0);
    assert!(store.list_activities(WorkId(1)).await.unwrap().is_empty());

    let again = sync.reinitialize_all(true).await.data.unwrap();
    assert_eq!(again.cleared, 0);
    assert_eq!(again.skipped, 1);
}

#[tokio::test]
async fn test_sync_state_transitions() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());

    assert_eq!(
        sync.sync_state(WorkId(1)).await.data,
        Some(WorkSyncState::Uninitialized)
    );

    store
        .update_work(WorkId(1), wpt_store::WorkPatch::schedule(Some(FOUNDATION.into())))
        .await
        .unwrap();
    assert_eq!(
        sync.sync_state(WorkId(1)).await.data,
        Some(WorkSyncState::DocumentOnly)
    );

    assert!(sync.initialize_activities_from_schedule(WorkId(1)).await.success);
    assert_eq!(
        sync.sync_state(WorkId(1)).await.data,
        Some(WorkSyncState::Synchronized)
    );
}

#[tokio::test]
async fn test_inspect_reports_divergence() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store.clone());
    assert!(sync.save_schedule(WorkId(1), SAMPLE_SCHEDULE).await.success);

    let clean = sync.inspect(WorkId(1)).await.data.unwrap();
    assert_eq!(clean.task_count, 4);
    assert_eq!(clean.activity_count, 4);
    assert!(clean.diverged.is_empty());

    let id = activity_id(store.as_ref(), 1, "3").await;
    store
        .update_activity(id, ActivityPatch::progress(70.0))
        .await
        .unwrap();
    let drifted = sync.inspect(WorkId(1)).await.data.unwrap();
    assert_eq!(drifted.diverged.len(), 1);
    assert_eq!(drifted.diverged[0].activity_code, "3");

    assert!(sync.sync_document_from_activities(WorkId(1)).await.success);
    assert!(sync.inspect(WorkId(1)).await.data.unwrap().diverged.is_empty());
}

#[tokio::test]
async fn test_progress_summary_of_sample() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store);
    assert!(sync.save_schedule(WorkId(1), SAMPLE_SCHEDULE).await.success);

    let summary = sync.progress_summary(WorkId(1)).await.data.unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.not_started, 0);
    assert_eq!(summary.in_progress, 3);
    assert!((summary.overall_percentage - 91.666_667).abs() < 1e-6);

    assert_eq!(summary.main_activities.len(), 1);
    assert_eq!(summary.main_activities[0].activity_code, "1");
    assert_eq!(summary.main_activities[0].leaf_count, 2);
}

#[tokio::test]
async fn test_list_activities_in_display_order() {
    let store = Arc::new(MemoryStore::new());
    seed_work(store.as_ref(), 1, "Pier").await;
    let sync = synchronizer(store);
    assert!(sync.save_schedule(WorkId(1), SAMPLE_SCHEDULE).await.success);

    let rows = sync.list_activities(WorkId(1)).await.data.unwrap();
    let order: Vec<_> = rows.iter().map(|a| a.display_order).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);

    let missing = sync.list_activities(WorkId(9)).await;
    assert_eq!(missing.error_kind, Some(ErrorKind::NotFound));
}
