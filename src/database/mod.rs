use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::utils::{self, Profile};

mod items;
mod lists;
mod tasks;
mod templates;

/// File name of the store inside the data directory
pub const DATABASE_FILE_NAME: &str = "taskmanager.db";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Cannot update {0} without an id")]
    MissingId(&'static str),
    #[error("No {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },
}

/// Table definitions, in creation order.
///
/// Relationships are declared but SQLite leaves foreign keys unenforced
/// unless `PRAGMA foreign_keys` is switched on, which this store never does:
/// deleting a list or template leaves its items in place.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS tasks (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        title           TEXT NOT NULL,
        description     TEXT,
        deadline        DATETIME,
        priority        INTEGER DEFAULT 0,
        is_completed    BOOLEAN DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS todo_lists (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL,
        date            DATE NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS todo_items (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        list_id         INTEGER NOT NULL,
        title           TEXT NOT NULL,
        description     TEXT,
        priority        INTEGER DEFAULT 0,
        duration        INTEGER DEFAULT 30,
        completed       BOOLEAN DEFAULT 0,
        FOREIGN KEY(list_id) REFERENCES todo_lists(id)
    )",
    "CREATE TABLE IF NOT EXISTS templates (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS template_items (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        template_id     INTEGER NOT NULL,
        title           TEXT NOT NULL,
        description     TEXT,
        priority        INTEGER DEFAULT 0,
        duration        INTEGER DEFAULT 30,
        FOREIGN KEY(template_id) REFERENCES templates(id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_deadline ON tasks(deadline)",
    "CREATE INDEX IF NOT EXISTS idx_todo_lists_date ON todo_lists(date)",
    "CREATE INDEX IF NOT EXISTS idx_todo_items_list_id ON todo_items(list_id)",
    "CREATE INDEX IF NOT EXISTS idx_template_items_template_id ON template_items(template_id)",
];

/// Owned handle to the store. Every repository, query and backup operation
/// goes through this value; nothing else touches the connection.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the store at `path` and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(format!("{}: {}", parent.display(), e)))?;
            }
        }

        debug!(path = %path.display(), "opening database");
        let conn = Connection::open(&path)?;

        let db = Database { conn, path };
        db.initialize()?;
        info!(path = %db.path.display(), "database ready");

        Ok(db)
    }

    /// Open the store in the platform data directory for `profile`
    pub fn open_in_profile(profile: Profile) -> Result<Self, DatabaseError> {
        let data_dir = utils::get_data_dir(profile)
            .ok_or_else(|| DatabaseError::DirectoryError("Could not determine data directory".to_string()))?;
        Self::open(data_dir.join(DATABASE_FILE_NAME))
    }

    /// Create any missing tables and indexes. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            self.conn.execute(statement, [])?;
        }
        Ok(())
    }

    /// Release the connection
    pub fn close(self) -> Result<(), DatabaseError> {
        debug!(path = %self.path.display(), "closing database");
        self.conn.close().map_err(|(_, e)| DatabaseError::from(e))
    }

    /// Location of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the underlying connection
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Swap the live connection for a fresh one on the same file.
    ///
    /// `swap` runs while no connection holds the file open.
    pub(crate) fn reopen_with<F>(&mut self, swap: F) -> Result<(), DatabaseError>
    where
        F: FnOnce(&Path) -> std::io::Result<()>,
    {
        let placeholder = Connection::open_in_memory()?;
        let old = std::mem::replace(&mut self.conn, placeholder);
        if let Err((conn, e)) = old.close() {
            self.conn = conn;
            return Err(e.into());
        }

        let swapped = swap(&self.path);

        // Reopen whatever is on disk now, even if the swap failed part-way
        self.conn = Connection::open(&self.path)?;
        swapped?;
        self.initialize()?;
        Ok(())
    }
}

/// Reject updates on values that were never stored
fn require_id(id: Option<i64>, entity: &'static str) -> Result<i64, DatabaseError> {
    id.ok_or(DatabaseError::MissingId(entity))
}

/// Collapse a failed listing into an empty one, logging the cause
fn or_empty<T>(what: &str, result: Result<Vec<T>, DatabaseError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "{} failed", what);
        Vec::new()
    })
}

/// Collect mapped rows, skipping the ones whose columns fail to decode
/// (an out-of-range priority, a negative duration, a malformed date).
/// Any other error still fails the whole read.
fn decode_rows<T>(
    what: &str,
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, DatabaseError> {
    let mut decoded = Vec::new();
    for row in rows {
        match row {
            Ok(value) => decoded.push(value),
            Err(
                e @ (rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::IntegralValueOutOfRange(..)
                | rusqlite::Error::InvalidColumnType(..)),
            ) => warn!(error = %e, "{} skipped a row", what),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(decoded)
}

/// Turn "no rows" into `None`
fn optional<T>(result: Result<T, rusqlite::Error>) -> Result<Option<T>, DatabaseError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent_in_memory() {
        let conn = Connection::open_in_memory().unwrap();
        let db = Database { conn, path: PathBuf::from(":memory:") };
        db.initialize().unwrap();
        db.initialize().unwrap();

        let tables: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn failed_swap_still_reopens_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let mut db = Database::open(&path).unwrap();
        db.conn().execute("INSERT INTO templates (name) VALUES ('kept')", []).unwrap();

        let err = db.reopen_with(|_| Err(std::io::Error::other("swap refused"))).unwrap_err();
        assert!(matches!(err, DatabaseError::IoError(_)));

        // Writes after the failure land in the file, not in a throwaway connection
        db.conn().execute("INSERT INTO templates (name) VALUES ('after')", []).unwrap();
        db.close().unwrap();
        let reopened = Database::open(&path).unwrap();
        let names: Vec<String> = reopened.get_all_templates().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["kept", "after"]);
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT column1 FROM (VALUES (1), (-4), (7))").unwrap();
        let rows = stmt.query_map([], |row| row.get::<_, u32>(0)).unwrap();
        assert_eq!(decode_rows("numbers", rows).unwrap(), [1, 7]);
    }

    #[test]
    fn optional_maps_missing_row_to_none() {
        let missing: Result<i64, rusqlite::Error> = Err(rusqlite::Error::QueryReturnedNoRows);
        assert!(optional(missing).unwrap().is_none());
        assert_eq!(optional(Ok(3)).unwrap(), Some(3));
    }
}
