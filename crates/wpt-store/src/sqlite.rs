//! SQLite store

use crate::schema::{CREATE_SCHEMA, SCHEMA_VERSION};
use crate::store::WorkStore;
use crate::types::{
    Activity, ActivityId, ActivityPatch, NewActivity, NewWork, WorkId, WorkPatch, WorkRecord,
};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

const WORK_COLUMNS: &str = "id, name, schedule_data, created_at, updated_at";

const ACTIVITY_COLUMNS: &str = "id, work_id, activity_code, activity_name, parent_activity_id, \
     is_main_activity, start_date, end_date, duration, progress_percentage, display_order, \
     created_at, updated_at";

/// Work row as stored
struct WorkRow {
    id: i64,
    name: String,
    schedule_data: Option<String>,
    created_at: String,
    updated_at: String,
}

impl WorkRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            schedule_data: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_record(self) -> StoreResult<WorkRecord> {
        Ok(WorkRecord {
            id: WorkId(self.id),
            name: self.name,
            schedule_data: self.schedule_data,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Activity row as stored
struct ActivityRow {
    id: i64,
    work_id: i64,
    activity_code: String,
    activity_name: String,
    parent_activity_id: Option<i64>,
    is_main_activity: bool,
    start_date: Option<String>,
    end_date: Option<String>,
    duration: Option<f64>,
    progress_percentage: f64,
    display_order: i64,
    created_at: String,
    updated_at: String,
}

impl ActivityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            work_id: row.get(1)?,
            activity_code: row.get(2)?,
            activity_name: row.get(3)?,
            parent_activity_id: row.get(4)?,
            is_main_activity: row.get(5)?,
            start_date: row.get(6)?,
            end_date: row.get(7)?,
            duration: row.get(8)?,
            progress_percentage: row.get(9)?,
            display_order: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_activity(self) -> StoreResult<Activity> {
        let display_order = u32::try_from(self.display_order).map_err(|_| {
            StoreError::Corrupt(format!(
                "activity {} has display_order {}",
                self.id, self.display_order
            ))
        })?;

        Ok(Activity {
            id: ActivityId(self.id),
            work_id: WorkId(self.work_id),
            activity_code: self.activity_code,
            activity_name: self.activity_name,
            parent_activity_id: self.parent_activity_id.map(ActivityId),
            is_main_activity: self.is_main_activity,
            start_date: self.start_date,
            end_date: self.end_date,
            duration: self.duration,
            progress_percentage: self.progress_percentage,
            display_order,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp {raw:?}: {e}")))
}

/// Store backed by a single SQLite connection
#[derive(Debug, Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file
    ///
    /// # Errors
    /// [`StoreError::Database`] if the file cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!("Opened schedule database at {}", path.as_ref().display());
        Self::initialize(conn)
    }

    /// Open an in-memory database
    ///
    /// # Errors
    /// [`StoreError::Database`] if initialization fails.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(CREATE_SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_migrations (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Current schema version
    ///
    /// # Errors
    /// [`StoreError::Database`] on query failure.
    pub fn schema_version(&self) -> StoreResult<Option<u32>> {
        let conn = self.connection.lock();
        let version = conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })?;
        Ok(version)
    }

    fn fetch_work(conn: &Connection, id: WorkId) -> StoreResult<Option<WorkRecord>> {
        conn.query_row(
            &format!("SELECT {WORK_COLUMNS} FROM works WHERE id = ?1"),
            params![id.0],
            WorkRow::from_row,
        )
        .optional()?
        .map(WorkRow::into_record)
        .transpose()
    }

    fn fetch_activity(conn: &Connection, id: ActivityId) -> StoreResult<Option<Activity>> {
        conn.query_row(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"),
            params![id.0],
            ActivityRow::from_row,
        )
        .optional()?
        .map(ActivityRow::into_activity)
        .transpose()
    }
}

#[async_trait]
impl WorkStore for SqliteStore {
    async fn get_work(&self, id: WorkId) -> StoreResult<Option<WorkRecord>> {
        let conn = self.connection.lock();
        Self::fetch_work(&conn, id)
    }

    async fn insert_work(&self, work: NewWork) -> StoreResult<WorkRecord> {
        let conn = self.connection.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO works (id, name, schedule_data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![work.id.map(|id| id.0), work.name, work.schedule_data, now],
        )?;
        let id = WorkId(conn.last_insert_rowid());
        Self::fetch_work(&conn, id)?.ok_or(StoreError::WorkNotFound(id))
    }

    async fn update_work(&self, id: WorkId, patch: WorkPatch) -> StoreResult<WorkRecord> {
        let conn = self.connection.lock();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE works SET
                name = COALESCE(?2, name),
                schedule_data = CASE WHEN ?3 THEN ?4 ELSE schedule_data END,
                updated_at = ?5
             WHERE id = ?1",
            params![
                id.0,
                patch.name,
                patch.schedule_data.is_some(),
                patch.schedule_data.flatten(),
                now
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::WorkNotFound(id));
        }
        Self::fetch_work(&conn, id)?.ok_or(StoreError::WorkNotFound(id))
    }

    async fn list_works_with_schedule(&self) -> StoreResult<Vec<WorkId>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT id FROM works
             WHERE schedule_data IS NOT NULL
               AND TRIM(schedule_data, ' ' || char(9) || char(10) || char(13)) != ''
             ORDER BY id",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .map(|id| id.map(WorkId))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    async fn list_activities(&self, work_id: WorkId) -> StoreResult<Vec<Activity>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities
             WHERE work_id = ?1 ORDER BY display_order, id"
        ))?;
        let rows = stmt
            .query_map(params![work_id.0], ActivityRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ActivityRow::into_activity).collect()
    }

    async fn get_activity(&self, id: ActivityId) -> StoreResult<Option<Activity>> {
        let conn = self.connection.lock();
        Self::fetch_activity(&conn, id)
    }

    async fn insert_activities(&self, rows: Vec<NewActivity>) -> StoreResult<Vec<Activity>> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        let mut inserted = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO activities (work_id, activity_code, activity_name, is_main_activity,
                    start_date, end_date, duration, progress_percentage, display_order,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            )?;
            for row in rows {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM works WHERE id = ?1)",
                    params![row.work_id.0],
                    |r| r.get(0),
                )?;
                if !exists {
                    return Err(StoreError::WorkNotFound(row.work_id));
                }

                stmt.execute(params![
                    row.work_id.0,
                    row.activity_code,
                    row.activity_name,
                    row.is_main_activity,
                    row.start_date,
                    row.end_date,
                    row.duration,
                    row.progress_percentage,
                    i64::from(row.display_order),
                    stamp,
                ])?;
                let id = ActivityId(tx.last_insert_rowid());
                inserted.push(row.into_activity(id, now));
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    async fn update_activity(
        &self,
        id: ActivityId,
        patch: ActivityPatch,
    ) -> StoreResult<Activity> {
        let conn = self.connection.lock();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE activities SET
                progress_percentage = COALESCE(?2, progress_percentage),
                parent_activity_id = CASE WHEN ?3 THEN ?4 ELSE parent_activity_id END,
                updated_at = ?5
             WHERE id = ?1",
            params![
                id.0,
                patch.progress_percentage,
                patch.parent_activity_id.is_some(),
                patch.parent_activity_id.flatten().map(|p| p.0),
                now
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::ActivityNotFound(id));
        }
        Self::fetch_activity(&conn, id)?.ok_or(StoreError::ActivityNotFound(id))
    }

    async fn delete_activities(&self, work_id: WorkId) -> StoreResult<usize> {
        let conn = self.connection.lock();
        let deleted = conn.execute(
            "DELETE FROM activities WHERE work_id = ?1",
            params![work_id.0],
        )?;
        Ok(deleted)
    }
}
