//! Schedule synchronizer
//!
//! Orders the logical steps of every operation over the two stores:
//! - The schedule document is authoritative for structure; saving it rebuilds
//!   the work's activities from scratch
//! - Activity rows are authoritative for progress; updating them rewrites the
//!   document's `progress` fields
//! - Primary writes abort on failure; derivative syncs only warn
//! - Cached views of a work are dropped after every mutation

use crate::cache::{CachedView, MokaViewCache, NoopCache, ViewCache, ViewKey};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::projector::{project, resolve_parents, Projection};
use crate::reconciler::{apply_on_load, diverged_tasks, reconcile, Divergence, WorkSyncState};
use crate::result::{OperationResult, SyncWarning};
use crate::rollup::{summarize, ProgressSummary};
use crate::scale::is_valid_percentage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use wpt_schedule::{ScheduleDocument, ScheduleTask};
use wpt_store::{Activity, ActivityId, ActivityPatch, WorkId, WorkPatch, WorkRecord, WorkStore};

/// Outcome of a schedule save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub work_id: WorkId,
    /// Tasks in the saved document
    pub task_count: usize,
    /// Rebuild result; `None` when nothing was rebuilt
    pub activities: Option<InitReport>,
}

/// Outcome of an activity (re)initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub work_id: WorkId,
    /// Rows deleted before re-deriving; zero for a first initialization
    pub activities_removed: usize,
    pub activities_created: usize,
    pub parents_linked: usize,
}

/// Outcome of a document rewrite from activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DocumentSync {
    /// Document rewritten and persisted
    Rewritten { tasks_updated: usize },
    /// Work has no document yet
    NoDocument,
    /// Work has no activities to push
    NoActivities,
}

/// Outcome of a single progress update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub activity: Activity,
    /// `None` when the document rewrite failed
    pub document: Option<DocumentSync>,
}

/// One entry of a bulk progress update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub activity_code: String,
    /// Percentage in `[0, 100]`
    pub progress: f64,
}

impl ProgressEntry {
    /// Create entry
    #[must_use]
    pub fn new(activity_code: impl Into<String>, progress: f64) -> Self {
        Self {
            activity_code: activity_code.into(),
            progress,
        }
    }
}

/// Bulk entry that was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedUpdate {
    pub activity_code: String,
    pub reason: String,
}

/// Outcome of a bulk progress update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkUpdateReport {
    pub updated: usize,
    pub skipped: Vec<SkippedUpdate>,
    /// `None` when nothing was updated or the rewrite failed
    pub document: Option<DocumentSync>,
}

/// Per-work failure inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkFailure {
    pub work_id: WorkId,
    pub error: String,
}

/// Outcome of a batch re-initialization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub initialized: usize,
    /// Forced works whose activities were deleted and whose schedule has no
    /// tasks left
    pub cleared: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<WorkFailure>,
}

/// Consistency report for one work
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub work_id: WorkId,
    pub state: WorkSyncState,
    pub task_count: usize,
    pub activity_count: usize,
    pub diverged: Vec<Divergence>,
}

type Warned<T> = (T, Option<SyncWarning>);

/// Keeps a work's schedule document and activity rows consistent
#[derive(Debug, Clone)]
pub struct ScheduleSynchronizer {
    store: Arc<dyn WorkStore>,
    cache: Arc<dyn ViewCache>,
    config: SyncConfig,
}

impl ScheduleSynchronizer {
    /// Create synchronizer over an injected store and cache
    #[must_use]
    pub fn new(store: Arc<dyn WorkStore>, cache: Arc<dyn ViewCache>, config: SyncConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Create synchronizer with the cache the configuration asks for
    #[must_use]
    pub fn from_config(store: Arc<dyn WorkStore>, config: SyncConfig) -> Self {
        let cache: Arc<dyn ViewCache> = if config.cache.enabled {
            Arc::new(MokaViewCache::new(config.cache.max_capacity))
        } else {
            Arc::new(NoopCache)
        };
        Self::new(store, cache, config)
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn WorkStore> {
        &self.store
    }

    /// Save a schedule document and rebuild the work's activities
    ///
    /// # Workflow
    /// 1. Persist the raw string (blank input clears it)
    /// 2. Decode the saved document
    /// 3. With a non-empty task list, delete and re-derive all activities
    /// 4. Drop cached views
    ///
    /// Only a failure in step 1 fails the save. A failure in step 2 or 3
    /// leaves the saved document and the existing activities in place and is
    /// reported as a warning.
    pub async fn save_schedule(&self, work_id: WorkId, raw: &str) -> OperationResult<SaveReport> {
        OperationResult::from_warned(self.try_save_schedule(work_id, raw).await)
    }

    async fn try_save_schedule(
        &self,
        work_id: WorkId,
        raw: &str,
    ) -> Result<Warned<SaveReport>, SyncError> {
        tracing::info!("Saving schedule for work {}", work_id);

        let stored = (!raw.trim().is_empty()).then(|| raw.to_string());

        if let Err(e) = self
            .store
            .update_work(work_id, WorkPatch::schedule(stored))
            .await
        {
            tracing::error!("Schedule save for work {} failed: {}", work_id, e);
            return Err(e.into());
        }

        let document = match ScheduleDocument::decode(Some(raw)) {
            Ok(document) => document,
            Err(e) => {
                let e = SyncError::from(e);
                tracing::warn!(
                    "Schedule for work {} saved, activities not rebuilt: {}",
                    work_id,
                    e
                );
                self.cache.invalidate_work(work_id).await;
                let report = SaveReport {
                    work_id,
                    task_count: 0,
                    activities: None,
                };
                return Ok((report, Some(SyncWarning::partial_sync(&e))));
            }
        };

        let tasks = document.as_ref().map_or(&[][..], ScheduleDocument::tasks);
        let mut report = SaveReport {
            work_id,
            task_count: tasks.len(),
            activities: None,
        };
        let mut warning = None;

        if !tasks.is_empty() {
            match self.rebuild_activities(work_id, tasks).await {
                Ok(init) => report.activities = Some(init),
                Err(e) => {
                    tracing::warn!(
                        "Schedule for work {} saved, activity rebuild failed: {}",
                        work_id,
                        e
                    );
                    warning = Some(SyncWarning::partial_sync(&e));
                }
            }
        }

        self.cache.invalidate_work(work_id).await;
        tracing::info!(
            "Saved schedule for work {} ({} tasks)",
            work_id,
            report.task_count
        );
        Ok((report, warning))
    }

    /// Load the schedule as the editor should see it
    ///
    /// Reconciled against activity rows when both exist, raw otherwise.
    /// `None` if no schedule was ever saved.
    pub async fn load_schedule(&self, work_id: WorkId) -> OperationResult<Option<ScheduleDocument>> {
        self.try_load_schedule(work_id)
            .await
            .map(|doc| doc.map(|doc| ScheduleDocument::clone(&doc)))
            .into()
    }

    async fn try_load_schedule(
        &self,
        work_id: WorkId,
    ) -> Result<Option<Arc<ScheduleDocument>>, SyncError> {
        let key = ViewKey::Schedule(work_id);
        if let Some(CachedView::Schedule(doc)) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(doc);
        }

        let work = self.require_work(work_id).await?;
        let document = match ScheduleDocument::decode(work.schedule_data.as_deref())? {
            Some(document) => {
                let activities = self.store.list_activities(work_id).await?;
                Some(Arc::new(apply_on_load(document, &activities)))
            }
            None => None,
        };

        self.cache
            .set(
                key,
                CachedView::Schedule(document.clone()),
                self.config.cache.ttl(),
            )
            .await;
        Ok(document)
    }

    /// Activities of a work in display order
    pub async fn list_activities(&self, work_id: WorkId) -> OperationResult<Vec<Activity>> {
        self.try_list_activities(work_id)
            .await
            .map(|rows| Vec::clone(&rows))
            .into()
    }

    async fn try_list_activities(&self, work_id: WorkId) -> Result<Arc<Vec<Activity>>, SyncError> {
        let key = ViewKey::Activities(work_id);
        if let Some(CachedView::Activities(rows)) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(rows);
        }

        self.require_work(work_id).await?;
        let rows = Arc::new(self.store.list_activities(work_id).await?);
        self.cache
            .set(
                key,
                CachedView::Activities(Arc::clone(&rows)),
                self.config.cache.ttl(),
            )
            .await;
        Ok(rows)
    }

    /// Set one activity's progress, then rewrite the document
    pub async fn update_activity_progress(
        &self,
        activity_id: ActivityId,
        percentage: f64,
        work_id: WorkId,
    ) -> OperationResult<ProgressUpdate> {
        OperationResult::from_warned(
            self.try_update_activity_progress(activity_id, percentage, work_id)
                .await,
        )
    }

    async fn try_update_activity_progress(
        &self,
        activity_id: ActivityId,
        percentage: f64,
        work_id: WorkId,
    ) -> Result<Warned<ProgressUpdate>, SyncError> {
        if !is_valid_percentage(percentage) {
            return Err(SyncError::validation(format!(
                "progress {percentage} outside [0, 100]"
            )));
        }

        match self.store.get_activity(activity_id).await? {
            Some(activity) if activity.work_id == work_id => {}
            _ => return Err(SyncError::ActivityNotFound(activity_id)),
        }

        let activity = match self
            .store
            .update_activity(activity_id, ActivityPatch::progress(percentage))
            .await
        {
            Ok(activity) => activity,
            Err(e) => {
                tracing::error!("Progress update for activity {} failed: {}", activity_id, e);
                return Err(e.into());
            }
        };
        self.cache.invalidate_work(work_id).await;
        tracing::info!(
            "Activity {} of work {} set to {}%",
            activity_id,
            work_id,
            percentage
        );

        let (document, warning) = self.derive_document(work_id).await;
        Ok((ProgressUpdate { activity, document }, warning))
    }

    /// Apply many progress updates by activity code, then rewrite the document once
    ///
    /// Unknown codes and out-of-range values are skipped and reported; the
    /// batch never aborts on a single entry.
    pub async fn bulk_update_activities_progress(
        &self,
        work_id: WorkId,
        updates: &[ProgressEntry],
    ) -> OperationResult<BulkUpdateReport> {
        OperationResult::from_warned(self.try_bulk_update(work_id, updates).await)
    }

    async fn try_bulk_update(
        &self,
        work_id: WorkId,
        updates: &[ProgressEntry],
    ) -> Result<Warned<BulkUpdateReport>, SyncError> {
        self.require_work(work_id).await?;
        let activities = self.store.list_activities(work_id).await?;

        let mut by_code: HashMap<&str, ActivityId> = HashMap::with_capacity(activities.len());
        for activity in &activities {
            by_code
                .entry(activity.activity_code.as_str())
                .or_insert(activity.id);
        }

        let mut updated = 0;
        let mut skipped = Vec::new();
        for entry in updates {
            let skip = |reason: String| {
                tracing::warn!(
                    "Skipping update for activity {} of work {}: {}",
                    entry.activity_code,
                    work_id,
                    reason
                );
                SkippedUpdate {
                    activity_code: entry.activity_code.clone(),
                    reason,
                }
            };

            let Some(&activity_id) = by_code.get(entry.activity_code.as_str()) else {
                skipped.push(skip("no matching activity".to_string()));
                continue;
            };
            if !is_valid_percentage(entry.progress) {
                skipped.push(skip(format!("progress {} outside [0, 100]", entry.progress)));
                continue;
            }

            match self
                .store
                .update_activity(activity_id, ActivityPatch::progress(entry.progress))
                .await
            {
                Ok(_) => updated += 1,
                Err(e) => skipped.push(skip(e.to_string())),
            }
        }

        let mut report = BulkUpdateReport {
            updated,
            skipped,
            document: None,
        };
        let mut warning = None;
        if updated > 0 {
            self.cache.invalidate_work(work_id).await;
            (report.document, warning) = self.derive_document(work_id).await;
        }

        tracing::info!(
            "Bulk update for work {}: {} updated, {} skipped",
            work_id,
            report.updated,
            report.skipped.len()
        );
        Ok((report, warning))
    }

    /// Derive activities for a work that has none yet
    pub async fn initialize_activities_from_schedule(
        &self,
        work_id: WorkId,
    ) -> OperationResult<InitReport> {
        self.try_initialize(work_id).await.into()
    }

    async fn try_initialize(&self, work_id: WorkId) -> Result<InitReport, SyncError> {
        let work = self.require_work(work_id).await?;

        let existing = self.store.list_activities(work_id).await?;
        if !existing.is_empty() {
            return Err(SyncError::AlreadyInitialized {
                work_id,
                count: existing.len(),
            });
        }

        let document = Self::require_document(&work)?;
        let report = self.build_activities(work_id, document.tasks()).await?;
        self.cache.invalidate_work(work_id).await;
        Ok(report)
    }

    /// Delete and re-derive a work's activities regardless of state
    pub async fn reinitialize_activities(&self, work_id: WorkId) -> OperationResult<InitReport> {
        self.try_reinitialize(work_id).await.into()
    }

    async fn try_reinitialize(&self, work_id: WorkId) -> Result<InitReport, SyncError> {
        let work = self.require_work(work_id).await?;
        let document = Self::require_document(&work)?;
        let report = self.rebuild_activities(work_id, document.tasks()).await;
        self.cache.invalidate_work(work_id).await;
        report
    }

    /// Initialize every work that has a schedule
    ///
    /// Works that already have activities are skipped unless `force`.
    pub async fn reinitialize_all(&self, force: bool) -> OperationResult<BatchReport> {
        self.try_reinitialize_all(force).await.into()
    }

    async fn try_reinitialize_all(&self, force: bool) -> Result<BatchReport, SyncError> {
        let work_ids = self.store.list_works_with_schedule().await?;
        tracing::info!(
            "Re-initializing {} works (force: {})",
            work_ids.len(),
            force
        );

        let mut report = BatchReport::default();
        for work_id in work_ids {
            report.processed += 1;

            let outcome = if force {
                self.try_reinitialize(work_id).await
            } else {
                self.try_initialize(work_id).await
            };

            match outcome {
                Ok(init) if init.activities_created > 0 => report.initialized += 1,
                Ok(init) if init.activities_removed > 0 => {
                    tracing::warn!(
                        "Work {} has no tasks left, {} activities removed",
                        work_id,
                        init.activities_removed
                    );
                    report.cleared += 1;
                }
                Ok(_) | Err(SyncError::AlreadyInitialized { .. }) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("Re-initialization of work {} failed: {}", work_id, e);
                    report.failed += 1;
                    report.failures.push(WorkFailure {
                        work_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Re-initialization done: {} initialized, {} cleared, {} skipped, {} failed",
            report.initialized,
            report.cleared,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Rewrite the document's progress from activity rows and persist it
    ///
    /// A missing document or an empty activity set is a no-op.
    pub async fn sync_document_from_activities(
        &self,
        work_id: WorkId,
    ) -> OperationResult<DocumentSync> {
        self.try_sync_document(work_id).await.into()
    }

    async fn try_sync_document(&self, work_id: WorkId) -> Result<DocumentSync, SyncError> {
        let work = self.require_work(work_id).await?;
        let Some(document) = ScheduleDocument::decode(work.schedule_data.as_deref())? else {
            tracing::debug!("Work {} has no document to sync", work_id);
            return Ok(DocumentSync::NoDocument);
        };

        let activities = self.store.list_activities(work_id).await?;
        if activities.is_empty() {
            tracing::debug!("Work {} has no activities to sync", work_id);
            return Ok(DocumentSync::NoActivities);
        }

        let reconciled = reconcile(document, &activities);
        let raw = reconciled.document.encode()?;
        self.store
            .update_work(work_id, WorkPatch::schedule(Some(raw)))
            .await?;
        self.cache.invalidate_work(work_id).await;

        tracing::debug!(
            "Document of work {} rewritten ({} tasks matched)",
            work_id,
            reconciled.matched
        );
        Ok(DocumentSync::Rewritten {
            tasks_updated: reconciled.matched,
        })
    }

    /// Duration-weighted progress roll-up
    pub async fn progress_summary(&self, work_id: WorkId) -> OperationResult<ProgressSummary> {
        self.try_list_activities(work_id)
            .await
            .map(|rows| summarize(work_id, &rows))
            .into()
    }

    /// Relationship between the work's document and activities
    pub async fn sync_state(&self, work_id: WorkId) -> OperationResult<WorkSyncState> {
        self.try_sync_state(work_id).await.into()
    }

    async fn try_sync_state(&self, work_id: WorkId) -> Result<WorkSyncState, SyncError> {
        let work = self.require_work(work_id).await?;
        let activities = self.store.list_activities(work_id).await?;
        Ok(WorkSyncState::classify(work.has_schedule(), activities.len()))
    }

    /// State plus every task whose progress disagrees with its activity
    pub async fn inspect(&self, work_id: WorkId) -> OperationResult<Inspection> {
        self.try_inspect(work_id).await.into()
    }

    async fn try_inspect(&self, work_id: WorkId) -> Result<Inspection, SyncError> {
        let work = self.require_work(work_id).await?;
        let document = ScheduleDocument::decode(work.schedule_data.as_deref())?;
        let activities = self.store.list_activities(work_id).await?;

        let diverged = document
            .as_ref()
            .map(|doc| diverged_tasks(doc, &activities))
            .unwrap_or_default();

        Ok(Inspection {
            work_id,
            state: WorkSyncState::classify(work.has_schedule(), activities.len()),
            task_count: document.as_ref().map_or(0, |doc| doc.tasks().len()),
            activity_count: activities.len(),
            diverged,
        })
    }

    async fn require_work(&self, work_id: WorkId) -> Result<WorkRecord, SyncError> {
        self.store
            .get_work(work_id)
            .await?
            .ok_or(SyncError::WorkNotFound(work_id))
    }

    fn require_document(work: &WorkRecord) -> Result<ScheduleDocument, SyncError> {
        ScheduleDocument::decode(work.schedule_data.as_deref())?
            .ok_or(SyncError::ScheduleMissing(work.id))
    }

    /// Document rewrite after an activity change; failures become a warning
    async fn derive_document(&self, work_id: WorkId) -> Warned<Option<DocumentSync>> {
        match self.try_sync_document(work_id).await {
            Ok(sync) => (Some(sync), None),
            Err(e) => {
                tracing::warn!("Document sync for work {} failed: {}", work_id, e);
                (None, Some(SyncWarning::partial_sync(&e)))
            }
        }
    }

    /// Delete and re-derive; a task list that fails projection deletes nothing
    async fn rebuild_activities(
        &self,
        work_id: WorkId,
        tasks: &[ScheduleTask],
    ) -> Result<InitReport, SyncError> {
        let projection = project(work_id, tasks)?;
        let deleted = self.store.delete_activities(work_id).await?;
        tracing::debug!("Deleted {} activities of work {}", deleted, work_id);
        let report = self.insert_projection(work_id, tasks, projection).await?;
        Ok(InitReport {
            activities_removed: deleted,
            ..report
        })
    }

    async fn build_activities(
        &self,
        work_id: WorkId,
        tasks: &[ScheduleTask],
    ) -> Result<InitReport, SyncError> {
        let projection = project(work_id, tasks)?;
        self.insert_projection(work_id, tasks, projection).await
    }

    async fn insert_projection(
        &self,
        work_id: WorkId,
        tasks: &[ScheduleTask],
        projection: Projection,
    ) -> Result<InitReport, SyncError> {
        let rows = match projection {
            Projection::Empty => {
                tracing::debug!("Schedule of work {} has no tasks", work_id);
                return Ok(InitReport {
                    work_id,
                    activities_removed: 0,
                    activities_created: 0,
                    parents_linked: 0,
                });
            }
            Projection::Rows(rows) => rows,
        };

        let inserted = self.store.insert_activities(rows).await?;
        let resolution = resolve_parents(tasks, &inserted);
        if resolution.unresolved > 0 {
            tracing::debug!(
                "{} parent references of work {} left unlinked",
                resolution.unresolved,
                work_id
            );
        }

        for link in &resolution.links {
            self.store
                .update_activity(link.child, ActivityPatch::parent(Some(link.parent)))
                .await?;
        }

        tracing::info!(
            "Created {} activities for work {} ({} parent links)",
            inserted.len(),
            work_id,
            resolution.links.len()
        );
        Ok(InitReport {
            work_id,
            activities_removed: 0,
            activities_created: inserted.len(),
            parents_linked: resolution.links.len(),
        })
    }
}
