//! Session ledger for ccnotify.
//!
//! Persists task records (one per prompt-to-completion cycle) using `rusqlite`.
//! Every hook invocation is a separate process, so all coordination between
//! events for a session happens through this database.
//!
//! # Concurrency
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Separate processes (or threads) each open their own `Database`; writers use
//! `IMMEDIATE` transactions and a busy timeout, so they queue rather than fail.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with milliseconds
//! (e.g., `2025-01-15T10:30:00.000Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Per-session sequence numbers
//!
//! `seq` is computed inside the inserting statement as one more than the
//! session's current maximum, and a unique index on `(session_id, seq)` rejects
//! anything that slips past.

use std::path::Path;
use std::time::Duration;

use ccn_core::{TaskRecord, format_duration};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;

/// How long a writer waits on another process's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TASK_COLUMNS: &str =
    "id, session_id, created_at, prompt, cwd, seq, stopped_at, last_wait_user_at";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A row we just wrote could not be read back.
    #[error("task {0} vanished during update")]
    TaskVanished(i64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for concurrency considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Tasks table: one row per prompt-to-completion cycle
            -- created_at/stopped_at/last_wait_user_at: RFC 3339 UTC
            -- seq: 1-based ordinal within session_id
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                prompt TEXT NOT NULL DEFAULT '',
                cwd TEXT NOT NULL DEFAULT '',
                seq INTEGER NOT NULL,
                stopped_at TEXT,
                last_wait_user_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_session_created ON tasks(session_id, created_at);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_session_seq ON tasks(session_id, seq);
            ",
        )?;
        Ok(())
    }

    /// Records a new task for `session_id` and returns it with its assigned `seq`.
    pub fn create_task(
        &mut self,
        session_id: &str,
        prompt: &str,
        cwd: &str,
    ) -> Result<TaskRecord, DbError> {
        self.create_task_at(session_id, prompt, cwd, Utc::now())
    }

    /// Like [`Self::create_task`] with an explicit creation time.
    pub fn create_task_at(
        &mut self,
        session_id: &str,
        prompt: &str,
        cwd: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskRecord, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "
            INSERT INTO tasks (session_id, created_at, prompt, cwd, seq)
            SELECT ?1, ?2, ?3, ?4, COALESCE(MAX(seq), 0) + 1
            FROM tasks
            WHERE session_id = ?1
            ",
            params![session_id, format_timestamp(now), prompt, cwd],
        )?;
        let id = tx.last_insert_rowid();
        let task = task_by_id(&tx, id)?.ok_or(DbError::TaskVanished(id))?;
        tx.commit()?;
        tracing::debug!(id, session_id, seq = task.seq, "created task");
        Ok(task)
    }

    /// Marks the newest open task of `session_id` as stopped.
    ///
    /// Returns `None`, changing nothing, when the session has no open task.
    pub fn close_most_recent_open_task(
        &mut self,
        session_id: &str,
    ) -> Result<Option<TaskRecord>, DbError> {
        self.close_most_recent_open_task_at(session_id, Utc::now())
    }

    /// Like [`Self::close_most_recent_open_task`] with an explicit stop time.
    pub fn close_most_recent_open_task_at(
        &mut self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskRecord>, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let open_id: Option<i64> = tx
            .query_row(
                "
                SELECT id FROM tasks
                WHERE session_id = ? AND stopped_at IS NULL
                ORDER BY created_at DESC, id DESC
                LIMIT 1
                ",
                [session_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = open_id else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE tasks SET stopped_at = ? WHERE id = ? AND stopped_at IS NULL",
            params![format_timestamp(now), id],
        )?;
        let task = task_by_id(&tx, id)?.ok_or(DbError::TaskVanished(id))?;
        tx.commit()?;
        Ok(Some(task))
    }

    /// Stamps `last_wait_user_at` on the most recently created task of `session_id`,
    /// open or not.
    ///
    /// Returns `false` when the session has no tasks.
    pub fn mark_waiting_for_user(&mut self, session_id: &str) -> Result<bool, DbError> {
        self.mark_waiting_for_user_at(session_id, Utc::now())
    }

    /// Like [`Self::mark_waiting_for_user`] with an explicit time.
    pub fn mark_waiting_for_user_at(
        &mut self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "
            UPDATE tasks SET last_wait_user_at = ?1
            WHERE id = (
                SELECT id FROM tasks
                WHERE session_id = ?2
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            ",
            params![format_timestamp(now), session_id],
        )?;
        Ok(updated > 0)
    }

    /// Elapsed time of a task, or `"Unknown"` if it is missing or still open.
    pub fn duration_of(&self, task_id: i64) -> Result<String, DbError> {
        let bounds: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT created_at, stopped_at FROM tasks WHERE id = ?",
                [task_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(match bounds {
            Some((created_at, Some(stopped_at))) => format_duration(&created_at, &stopped_at),
            _ => ccn_core::duration::UNKNOWN.to_string(),
        })
    }

    /// Loads a single task.
    pub fn task(&self, task_id: i64) -> Result<Option<TaskRecord>, DbError> {
        task_by_id(&self.conn, task_id)
    }

    /// Lists all tasks of a session ordered by `seq`.
    pub fn session_tasks(&self, session_id: &str) -> Result<Vec<TaskRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE session_id = ? ORDER BY seq ASC"
        ))?;
        let rows = stmt.query_map([session_id], task_from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

fn task_by_id(conn: &Connection, id: i64) -> Result<Option<TaskRecord>, DbError> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
            [id],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        created_at: row.get(2)?,
        prompt: row.get(3)?,
        cwd: row.get(4)?,
        seq: row.get(5)?,
        stopped_at: row.get(6)?,
        last_wait_user_at: row.get(7)?,
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use ccn_core::TaskStatus;
    use chrono::Duration;

    fn at(seconds: i64) -> DateTime<Utc> {
        let base: DateTime<Utc> = "2025-01-01T10:00:00Z".parse().unwrap();
        base + Duration::seconds(seconds)
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .unwrap();
        stmt.query_map([], |row| row.get(1))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .unwrap();
        stmt.query_map([], |row| row.get(1))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    fn row_count(db: &Database) -> i64 {
        db.conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(row_count(&db), 0);
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            table_columns(&db.conn, "tasks"),
            vec![
                "id",
                "session_id",
                "created_at",
                "prompt",
                "cwd",
                "seq",
                "stopped_at",
                "last_wait_user_at",
            ]
        );
        let indexes = index_names(&db.conn, "tasks");
        assert!(indexes.contains("idx_tasks_session_created"));
        assert!(indexes.contains("idx_tasks_session_seq"));
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("ccnotify.db");

        let mut first = Database::open(&path).unwrap();
        first.create_task("s1", "hello", "/repo").unwrap();
        drop(first);

        let second = Database::open(&path).unwrap();
        assert_eq!(second.session_tasks("s1").unwrap().len(), 1);
    }

    #[test]
    fn create_task_records_context() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db
            .create_task_at("s1", "fix the build", "/work/repo", at(0))
            .unwrap();

        assert_eq!(task.session_id, "s1");
        assert_eq!(task.prompt, "fix the build");
        assert_eq!(task.cwd, "/work/repo");
        assert_eq!(task.created_at, "2025-01-01T10:00:00.000Z");
        assert_eq!(task.seq, 1);
        assert_eq!(task.status(), TaskStatus::Running);
    }

    #[test]
    fn seq_is_contiguous_per_session_when_interleaved() {
        let mut db = Database::open_in_memory().unwrap();
        let sessions = ["a", "b", "a", "c", "a", "b", "a"];
        for (i, session) in sessions.iter().enumerate() {
            db.create_task_at(session, "p", "/repo", at(i64::try_from(i).unwrap()))
                .unwrap();
        }

        let seqs = |session: &str| -> Vec<i64> {
            db.session_tasks(session)
                .unwrap()
                .into_iter()
                .map(|task| task.seq)
                .collect()
        };
        assert_eq!(seqs("a"), vec![1, 2, 3, 4]);
        assert_eq!(seqs("b"), vec![1, 2]);
        assert_eq!(seqs("c"), vec![1]);
    }

    #[test]
    fn ids_increase_monotonically() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db.create_task("a", "p", "/repo").unwrap();
        let second = db.create_task("b", "p", "/repo").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn seq_survives_concurrent_writers() {
        const WRITERS: usize = 4;
        const TASKS_PER_WRITER: usize = 10;

        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("ccnotify.db");
        Database::open(&path).unwrap();

        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut db = Database::open(&path).unwrap();
                    for i in 0..TASKS_PER_WRITER {
                        db.create_task("shared", &format!("{writer}-{i}"), "/repo")
                            .unwrap();
                        db.create_task(&format!("own-{writer}"), "p", "/repo")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let db = Database::open(&path).unwrap();
        let seqs: Vec<i64> = db
            .session_tasks("shared")
            .unwrap()
            .into_iter()
            .map(|task| task.seq)
            .collect();
        let expected: Vec<i64> = (1..=i64::try_from(WRITERS * TASKS_PER_WRITER).unwrap()).collect();
        assert_eq!(seqs, expected);

        for writer in 0..WRITERS {
            assert_eq!(
                db.session_tasks(&format!("own-{writer}")).unwrap().len(),
                TASKS_PER_WRITER
            );
        }
    }

    #[test]
    fn close_without_open_task_returns_none() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.close_most_recent_open_task("nobody").unwrap(), None);

        let task = db.create_task_at("s1", "p", "/repo", at(0)).unwrap();
        db.close_most_recent_open_task_at("s1", at(10)).unwrap();
        let before = db.task(task.id).unwrap();

        assert_eq!(db.close_most_recent_open_task_at("s1", at(20)).unwrap(), None);
        assert_eq!(db.task(task.id).unwrap(), before);
        assert_eq!(row_count(&db), 1);
    }

    #[test]
    fn close_sets_stopped_at_once() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task_at("s1", "p", "/repo", at(0)).unwrap();

        let closed = db
            .close_most_recent_open_task_at("s1", at(150))
            .unwrap()
            .expect("open task");
        assert_eq!(closed.id, task.id);
        assert_eq!(closed.stopped_at.as_deref(), Some("2025-01-01T10:02:30.000Z"));
        assert_eq!(closed.status(), TaskStatus::Completed);
        assert_eq!(db.duration_of(task.id).unwrap(), "2m30s");
    }

    #[test]
    fn close_picks_latest_created_open_task() {
        let mut db = Database::open_in_memory().unwrap();
        // Inserted out of chronological order on purpose.
        let newer = db.create_task_at("s1", "newer", "/repo", at(100)).unwrap();
        let older = db.create_task_at("s1", "older", "/repo", at(50)).unwrap();
        db.create_task_at("s2", "other", "/repo", at(200)).unwrap();

        let closed = db.close_most_recent_open_task_at("s1", at(300)).unwrap().unwrap();
        assert_eq!(closed.id, newer.id);

        let closed = db.close_most_recent_open_task_at("s1", at(301)).unwrap().unwrap();
        assert_eq!(closed.id, older.id);

        assert_eq!(db.close_most_recent_open_task_at("s1", at(302)).unwrap(), None);
    }

    #[test]
    fn close_does_not_touch_other_sessions() {
        let mut db = Database::open_in_memory().unwrap();
        let other = db.create_task_at("s2", "p", "/repo", at(0)).unwrap();
        assert_eq!(db.close_most_recent_open_task_at("s1", at(5)).unwrap(), None);
        assert_eq!(db.task(other.id).unwrap().unwrap().stopped_at, None);
    }

    #[test]
    fn mark_waiting_on_empty_session_is_noop() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(!db.mark_waiting_for_user("ghost").unwrap());
        assert_eq!(row_count(&db), 0);
    }

    #[test]
    fn mark_waiting_targets_most_recent_task_even_if_closed() {
        let mut db = Database::open_in_memory().unwrap();
        let open = db.create_task_at("s1", "first", "/repo", at(0)).unwrap();
        let latest = db.create_task_at("s1", "second", "/repo", at(10)).unwrap();
        db.close_most_recent_open_task_at("s1", at(20)).unwrap();

        assert!(db.mark_waiting_for_user_at("s1", at(30)).unwrap());

        let latest = db.task(latest.id).unwrap().unwrap();
        assert_eq!(
            latest.last_wait_user_at.as_deref(),
            Some("2025-01-01T10:00:30.000Z")
        );
        assert_eq!(latest.status(), TaskStatus::Completed);
        assert_eq!(db.task(open.id).unwrap().unwrap().last_wait_user_at, None);
    }

    #[test]
    fn mark_waiting_can_repeat() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task_at("s1", "p", "/repo", at(0)).unwrap();
        db.mark_waiting_for_user_at("s1", at(5)).unwrap();
        db.mark_waiting_for_user_at("s1", at(9)).unwrap();

        let task = db.task(task.id).unwrap().unwrap();
        assert_eq!(task.last_wait_user_at.as_deref(), Some("2025-01-01T10:00:09.000Z"));
        assert_eq!(task.status(), TaskStatus::WaitingOnUser);
    }

    #[test]
    fn duration_of_open_or_missing_task_is_unknown() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task_at("s1", "p", "/repo", at(0)).unwrap();
        assert_eq!(db.duration_of(task.id).unwrap(), "Unknown");
        assert_eq!(db.duration_of(9999).unwrap(), "Unknown");
    }

    #[test]
    fn duration_of_long_task() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task_at("s1", "p", "/repo", at(0)).unwrap();
        db.close_most_recent_open_task_at("s1", at(4500)).unwrap();
        assert_eq!(db.duration_of(task.id).unwrap(), "1h15m");
    }
}
