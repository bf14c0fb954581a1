//! SQLite schema definitions and constants.

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// DDL applied when a database is opened
pub(crate) const CREATE_SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS works (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        schedule_data TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS activities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        work_id INTEGER NOT NULL,
        activity_code TEXT NOT NULL,
        activity_name TEXT NOT NULL,
        parent_activity_id INTEGER,
        is_main_activity INTEGER NOT NULL DEFAULT 0,
        start_date TEXT,
        end_date TEXT,
        duration REAL,
        progress_percentage REAL NOT NULL DEFAULT 0
            CHECK (progress_percentage >= 0 AND progress_percentage <= 100),
        display_order INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (work_id) REFERENCES works(id) ON DELETE CASCADE,
        FOREIGN KEY (parent_activity_id) REFERENCES activities(id) ON DELETE SET NULL
    );

    CREATE INDEX IF NOT EXISTS idx_activities_work_order
        ON activities (work_id, display_order);

"#;
