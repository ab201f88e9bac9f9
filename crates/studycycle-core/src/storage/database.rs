//! SQLite persistence.
//!
//! Provides persistent storage for:
//! - The current plan (`study_plan` kv entry)
//! - The progress ledger (`study_progress` kv entry)
//! - Append-only study session history

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::{data_dir, PlanRecord};
use crate::error::StorageError;
use crate::ledger::{LedgerMap, LedgerStore};
use crate::timer::{SessionHistory, StudySession};

/// kv key of the serialized [`PlanRecord`].
pub const PLAN_KEY: &str = "study_plan";
/// kv key of the serialized ledger map.
pub const PROGRESS_KEY: &str = "study_progress";

/// SQLite database backing the CLI.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open the database at `<data dir>/studycycle.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(data_dir()?.join("studycycle.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               TEXT PRIMARY KEY,
                subject          TEXT NOT NULL,
                topic            TEXT,
                subtopic         TEXT,
                task_id          TEXT,
                date             TEXT,
                start_time       TEXT NOT NULL,
                end_time         TEXT,
                duration_minutes INTEGER NOT NULL,
                completed        INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);",
        )?;
        Ok(())
    }

    // ── kv ───────────────────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Plan ─────────────────────────────────────────────────────────

    pub fn load_plan(&self) -> Result<Option<PlanRecord>, StorageError> {
        match self.kv_get(PLAN_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_plan(&self, plan: &PlanRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(plan)?;
        self.kv_set(PLAN_KEY, &json)?;
        debug!(plan = %plan.id, "saved plan");
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Append a closed session. Re-recording the same id replaces it.
    pub fn record_session(&self, session: &StudySession) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions
                (id, subject, topic, subtopic, task_id, date, start_time, end_time,
                 duration_minutes, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                session.id,
                session.subject,
                session.topic,
                session.subtopic,
                session.task_id,
                session.date.map(|d| d.to_string()),
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
                session.duration_minutes,
                session.completed,
            ],
        )?;
        Ok(())
    }

    /// All recorded sessions, oldest first.
    pub fn sessions(&self) -> Result<SessionHistory, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject, topic, subtopic, task_id, date, start_time, end_time,
                    duration_minutes, completed
             FROM sessions
             ORDER BY start_time, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                StudySession {
                    id: row.get(0)?,
                    subject: row.get(1)?,
                    topic: row.get(2)?,
                    subtopic: row.get(3)?,
                    task_id: row.get(4)?,
                    date: None,
                    start_time: DateTime::<Utc>::MIN_UTC,
                    end_time: None,
                    duration_minutes: row.get(8)?,
                    completed: row.get(9)?,
                },
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (mut session, date, start, end) = row?;
            session.date = date.as_deref().map(parse_date).transpose()?;
            session.start_time = parse_time(&start)?;
            session.end_time = end.as_deref().map(parse_time).transpose()?;
            sessions.push(session);
        }
        Ok(SessionHistory::from_sessions(sessions))
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, StorageError> {
    s.parse()
        .map_err(|e| StorageError::QueryFailed(format!("bad date '{s}': {e}")))
}

impl LedgerStore for Database {
    fn load(&self) -> Result<LedgerMap, StorageError> {
        match self.kv_get(PROGRESS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(LedgerMap::new()),
        }
    }

    fn save(&mut self, logs: &LedgerMap) -> Result<(), StorageError> {
        let json = serde_json::to_string(logs)?;
        self.kv_set(PROGRESS_KEY, &json)?;
        Ok(())
    }
}
