//! View cache using moka
//!
//! Holds recently computed per-work views (reconciled schedule, activity list)
//! with a per-entry time-to-live. The cache is owned by whoever builds the
//! [`crate::ScheduleSynchronizer`] and injected into it; its lifetime is the
//! service process.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wpt_schedule::ScheduleDocument;
use wpt_store::{Activity, WorkId};

/// Cache key, one per view per work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// Reconciled schedule document
    Schedule(WorkId),
    /// Activity rows in display order
    Activities(WorkId),
}

impl ViewKey {
    /// Every key belonging to a work
    #[must_use]
    pub fn all_for(work_id: WorkId) -> [Self; 2] {
        [Self::Schedule(work_id), Self::Activities(work_id)]
    }
}

impl std::fmt::Display for ViewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule(id) => write!(f, "schedule:{id}"),
            Self::Activities(id) => write!(f, "activities:{id}"),
        }
    }
}

/// Cached view value
#[derive(Debug, Clone)]
pub enum CachedView {
    /// Reconciled schedule; `None` when the work has none
    Schedule(Option<Arc<ScheduleDocument>>),
    /// Activity rows
    Activities(Arc<Vec<Activity>>),
}

/// Injectable view cache
#[async_trait]
pub trait ViewCache: Send + Sync + Debug {
    /// Fetch a live entry
    async fn get(&self, key: &ViewKey) -> Option<CachedView>;

    /// Store an entry for `ttl`
    async fn set(&self, key: ViewKey, value: CachedView, ttl: Duration);

    /// Drop one entry
    async fn invalidate(&self, key: &ViewKey);

    /// Drop every view of a work; called after each mutation
    async fn invalidate_work(&self, work_id: WorkId) {
        for key in ViewKey::all_for(work_id) {
            self.invalidate(&key).await;
        }
    }
}

#[derive(Debug, Clone)]
struct TtlEntry {
    view: CachedView,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<ViewKey, TtlEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &ViewKey,
        value: &TtlEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &ViewKey,
        value: &TtlEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process cache with per-entry TTL
#[derive(Debug, Clone)]
pub struct MokaViewCache {
    inner: Cache<ViewKey, TtlEntry>,
}

impl MokaViewCache {
    /// Create cache with max capacity
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MokaViewCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ViewCache for MokaViewCache {
    async fn get(&self, key: &ViewKey) -> Option<CachedView> {
        self.inner.get(key).await.map(|entry| entry.view)
    }

    async fn set(&self, key: ViewKey, value: CachedView, ttl: Duration) {
        self.inner.insert(key, TtlEntry { view: value, ttl }).await;
    }

    async fn invalidate(&self, key: &ViewKey) {
        self.inner.invalidate(key).await;
    }
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl ViewCache for NoopCache {
    async fn get(&self, _key: &ViewKey) -> Option<CachedView> {
        None
    }

    async fn set(&self, _key: ViewKey, _value: CachedView, _ttl: Duration) {}

    async fn invalidate(&self, _key: &ViewKey) {}
}
