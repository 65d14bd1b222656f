//! Whole-store backup and restore, and logical SQL export/import.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::database::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("I/O error on {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Not a usable database file: {0}")]
    InvalidBackup(PathBuf),
    #[error("Statement {index} failed ({statement}): {source}")]
    StatementError {
        index: usize,
        statement: String,
        #[source]
        source: rusqlite::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BackupError + '_ {
    move |source| BackupError::IoError { path: path.to_path_buf(), source }
}

/// How `restore_database` replaces the live store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Copy next to the live file, check it, then rename over the store.
    /// A failure before the rename leaves the current store untouched.
    #[default]
    Atomic,
    /// Delete the live file, then copy the backup in its place.
    /// A failed copy leaves no store behind.
    Legacy,
}

impl Database {
    /// Copy the store file byte for byte to `dest`
    pub fn backup_database(&self, dest: impl AsRef<Path>) -> Result<u64, BackupError> {
        let dest = dest.as_ref();
        let bytes = fs::copy(self.path(), dest).map_err(io_error(dest))?;
        info!(dest = %dest.display(), bytes, "database backed up");
        Ok(bytes)
    }

    /// Replace the live store with the backup at `src` and reopen it
    pub fn restore_database(&mut self, src: impl AsRef<Path>, mode: RestoreMode) -> Result<(), BackupError> {
        let src = src.as_ref();
        fs::File::open(src).map_err(io_error(src))?;

        match mode {
            RestoreMode::Atomic => self.restore_atomic(src)?,
            RestoreMode::Legacy => self.restore_legacy(src)?,
        }

        info!(src = %src.display(), ?mode, "database restored");
        Ok(())
    }

    fn restore_atomic(&mut self, src: &Path) -> Result<(), BackupError> {
        let staging = staging_path(self.path());
        fs::copy(src, &staging).map_err(io_error(&staging))?;

        if let Err(e) = check_database_file(&staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        debug!(staging = %staging.display(), "swapping restored store into place");
        let result = self.reopen_with(|live| fs::rename(&staging, live));
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result.map_err(BackupError::from)
    }

    fn restore_legacy(&mut self, src: &Path) -> Result<(), BackupError> {
        self.reopen_with(|live| {
            match fs::remove_file(live) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            fs::copy(src, live).map(|_| ())
        })
        .map_err(BackupError::from)
    }

    /// Render every user table as SQL: creation statement, then one INSERT per row
    pub fn dump_sql(&self) -> Result<String, BackupError> {
        let conn = self.conn();
        let mut out = String::new();
        out.push_str("PRAGMA foreign_keys=OFF;\n");
        out.push_str("BEGIN TRANSACTION;\n");

        let mut tables_stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )?;
        let tables = tables_stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        for (table, create_sql) in &tables {
            if let Some(create_sql) = create_sql {
                let _ = writeln!(out, "{};", create_if_missing(create_sql));
            }

            let mut rows_stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
            let columns = rows_stmt.column_count();
            let mut rows = rows_stmt.query([])?;
            let mut count = 0usize;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns);
                for i in 0..columns {
                    values.push(sql_literal(row.get_ref(i)?));
                }
                let _ = writeln!(out, "INSERT INTO {} VALUES ({});", quote_ident(table), values.join(","));
                count += 1;
            }
            debug!(table = %table, rows = count, "table dumped");
        }

        out.push_str("COMMIT;\n");
        out.push_str("PRAGMA foreign_keys=ON;");
        Ok(out)
    }

    /// Write `dump_sql` to `dest`
    pub fn export_to_sql(&self, dest: impl AsRef<Path>) -> Result<(), BackupError> {
        let dest = dest.as_ref();
        let dump = self.dump_sql()?;
        fs::write(dest, dump).map_err(io_error(dest))?;
        info!(dest = %dest.display(), "database exported");
        Ok(())
    }

    /// Run a SQL dump against the store, all or nothing.
    ///
    /// The dump's own transaction markers and foreign-key pragmas are skipped
    /// since the whole import already runs in one transaction. Statements on
    /// SQLite's internal tables (`sqlite_sequence`) are skipped too; the
    /// counters follow the explicit ids of the imported rows. Returns the
    /// number of statements executed.
    pub fn import_sql(&self, sql: &str) -> Result<usize, BackupError> {
        let tx = self.conn().unchecked_transaction()?;
        let mut executed = 0;

        for (index, statement) in split_statements(sql).into_iter().enumerate() {
            if is_dump_control(statement) || targets_internal_table(statement) {
                debug!(index, "import statement skipped");
                continue;
            }
            let statement = create_if_missing(statement);
            if let Err(source) = tx.execute_batch(&statement) {
                warn!(index, error = %source, "import statement failed, rolling back");
                return Err(BackupError::StatementError { index, statement, source });
            }
            executed += 1;
        }

        tx.commit()?;
        info!(statements = executed, "SQL import committed");
        Ok(executed)
    }

    /// Read a SQL dump from `src` and import it
    pub fn import_from_sql(&self, src: impl AsRef<Path>) -> Result<usize, BackupError> {
        let src = src.as_ref();
        let sql = fs::read_to_string(src).map_err(io_error(src))?;
        self.import_sql(&sql)
    }
}

/// Temporary file beside the live store, so the final rename stays on one filesystem
fn staging_path(live: &Path) -> PathBuf {
    let mut name = live.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".restoring");
    live.with_file_name(name)
}

fn check_database_file(path: &Path) -> Result<(), BackupError> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|_| BackupError::InvalidBackup(path.to_path_buf()))?;
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map_err(|_| BackupError::InvalidBackup(path.to_path_buf()))?;
    Ok(())
}

/// Split SQL text on `;` terminators that sit outside quoted strings and
/// identifiers. Empty statements are dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;

    for (i, c) in sql.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                ';' => {
                    let statement = sql[start..i].trim();
                    if !statement.is_empty() {
                        statements.push(statement);
                    }
                    start = i + 1;
                }
                _ => {}
            },
        }
    }

    let tail = sql[start..].trim();
    if !tail.is_empty() {
        statements.push(tail);
    }
    statements
}

/// Transaction markers and the foreign-key pragma the exporter wraps dumps in
fn is_dump_control(statement: &str) -> bool {
    let upper = statement.to_ascii_uppercase();
    let first = upper.split_whitespace().next().unwrap_or_default();
    matches!(first, "BEGIN" | "COMMIT" | "END" | "ROLLBACK")
        || upper.replace(' ', "").starts_with("PRAGMAFOREIGN_KEYS")
}

/// `CREATE TABLE sqlite_*` or `INSERT INTO sqlite_*`. SQLite owns these
/// tables and rejects creating them.
fn targets_internal_table(statement: &str) -> bool {
    let upper = statement.to_ascii_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| c.is_whitespace() || c == '(')
        .filter(|w| !w.is_empty())
        .take(6)
        .collect();
    let name = match words.as_slice() {
        ["CREATE", "TABLE", "IF", "NOT", "EXISTS", name, ..] => name,
        ["CREATE", "TABLE", name, ..] | ["INSERT", "INTO", name, ..] => name,
        _ => return false,
    };
    name.trim_matches(|c: char| matches!(c, '"' | '`' | '[' | ']')).starts_with("SQLITE_")
}

/// Turn `CREATE TABLE x` into `CREATE TABLE IF NOT EXISTS x` so a dump can be
/// replayed into an initialized store
fn create_if_missing(statement: &str) -> String {
    const PREFIX: &str = "CREATE TABLE ";
    let head = statement.get(..PREFIX.len()).unwrap_or_default();
    if !head.eq_ignore_ascii_case(PREFIX) {
        return statement.to_string();
    }
    let rest = statement[PREFIX.len()..].trim_start();
    if rest.get(..14).is_some_and(|s| s.eq_ignore_ascii_case("IF NOT EXISTS ")) {
        return statement.to_string();
    }
    format!("CREATE TABLE IF NOT EXISTS {rest}")
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render one column value as a SQL literal
pub fn sql_literal(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        // Overflows back to infinity when read
        ValueRef::Real(f) if f.is_infinite() => {
            let literal = if f > 0.0 { "9e999" } else { "-9e999" };
            literal.to_string()
        }
        ValueRef::Real(f) => format!("{f:?}"),
        ValueRef::Text(bytes) => format!("'{}'", String::from_utf8_lossy(bytes).replace('\'', "''")),
        ValueRef::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for b in bytes {
                let _ = write!(hex, "{b:02X}");
            }
            hex.push('\'');
            hex
        }
    }
}
