//! DuckDB driver implementation

use crate::error::{DbError, DbResult};
use crate::traits::Driver;
use async_trait::async_trait;
use duckdb::{params, Connection, OptionalExt};
use st_core::script::{line_column_from_offset, lines_before_and_after, split_statements};
use st_core::{AppliedVersions, BoxError, Direction, MigrationFile, PipeWriter, Version};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// URL scheme served by [`DuckDbDriver`].
pub const DUCKDB_SCHEME: &str = "duckdb";

/// Table recording applied versions.
pub const VERSION_TABLE: &str = "schema_migrations";

/// Lines of script shown on each side of a failing statement.
const CONTEXT_LINES: usize = 5;

/// Where a DuckDB URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuckDbTarget {
    /// `duckdb::memory:`
    InMemory,
    /// `duckdb:///absolute/path` or `duckdb://relative/path`
    File(PathBuf),
}

impl DuckDbTarget {
    /// Parse a `duckdb:` connection URL.
    pub fn parse(url: &str) -> DbResult<Self> {
        let invalid = |reason: &str| DbError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };
        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != DUCKDB_SCHEME {
            return Err(invalid("scheme must be duckdb"));
        }

        // Url::parse accepted the scheme, so this prefix is ASCII.
        let rest = &url[DUCKDB_SCHEME.len() + 1..];
        if rest == ":memory:" {
            return Ok(Self::InMemory);
        }
        let path = rest
            .strip_prefix("//")
            .ok_or_else(|| invalid("expected duckdb://<path> or duckdb::memory:"))?;
        if path.is_empty() {
            return Err(invalid("database path is empty"));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

/// DuckDB migration driver
pub struct DuckDbDriver {
    conn: Mutex<Option<Connection>>,
}

impl Default for DuckDbDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDbDriver {
    /// A blank driver; call [`Driver::initialize`] before use.
    pub fn new() -> Self {
        Self {
            conn: Mutex::new(None),
        }
    }

    fn slot(&self) -> DbResult<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Run `f` against the open connection.
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let slot = self.slot()?;
        let conn = slot
            .as_ref()
            .ok_or_else(|| DbError::NotInitialized(DUCKDB_SCHEME.to_string()))?;
        f(conn)
    }

    fn connect(target: &DuckDbTarget) -> DbResult<Connection> {
        let conn = match target {
            DuckDbTarget::InMemory => Connection::open_in_memory(),
            DuckDbTarget::File(path) => Connection::open(path),
        }
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (version UBIGINT PRIMARY KEY)"
        ))
        .map_err(|e| DbError::ConnectionError(format!("creating {VERSION_TABLE}: {e}")))?;
        Ok(conn)
    }

    /// Apply `file` in a single transaction.
    fn apply(&self, file: &MigrationFile) -> Result<(), BoxError> {
        let content = file.read_content()?;
        let script = String::from_utf8(content).map_err(|e| {
            DbError::ExecutionError(format!("{} is not valid UTF-8: {e}", file.file_name))
        })?;

        self.with_conn(|conn| {
            transaction(conn, |conn| {
                // Always-run files leave the version table untouched.
                if !file.always {
                    let version = file.version.get();
                    match file.direction {
                        Direction::Up => conn.execute(
                            &format!("INSERT INTO {VERSION_TABLE} (version) VALUES (?)"),
                            params![version],
                        )?,
                        Direction::Down => conn.execute(
                            &format!("DELETE FROM {VERSION_TABLE} WHERE version = ?"),
                            params![version],
                        )?,
                    };
                }

                for statement in split_statements(&script) {
                    conn.execute_batch(statement.sql)
                        .map_err(|e| statement_error(file, &script, statement.offset, e))?;
                }
                Ok(())
            })
        })?;
        Ok(())
    }
}

/// Run `body` between `BEGIN` and `COMMIT`, rolling back on error.
fn transaction<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> DbResult<T>,
) -> DbResult<T> {
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::ExecutionError(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(DbError::ExecutionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

/// Execution error annotated with the failing statement's position.
fn statement_error(
    file: &MigrationFile,
    script: &str,
    offset: usize,
    err: duckdb::Error,
) -> DbError {
    let (line, column) = line_column_from_offset(script, offset);
    let context = lines_before_and_after(script, line, CONTEXT_LINES, CONTEXT_LINES, true);
    DbError::ExecutionError(format!(
        "{err} in {} line {line}, column {column}:\n\n{context}",
        file.file_name
    ))
}

#[async_trait]
impl Driver for DuckDbDriver {
    async fn initialize(&self, url: &str) -> DbResult<()> {
        let target = DuckDbTarget::parse(url)?;
        let conn = Self::connect(&target)?;
        *self.slot()? = Some(conn);
        log::debug!("Connected to DuckDB at {:?}", target);
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        let conn = self.slot()?.take();
        match conn {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| DbError::ConnectionError(format!("close failed: {e}"))),
            None => Ok(()),
        }
    }

    fn filename_extension(&self) -> &'static str {
        "sql"
    }

    async fn migrate(&self, file: MigrationFile, pipe: PipeWriter) {
        pipe.file(file.clone()).await;
        log::debug!("Applying {} ({})", file.file_name, file.direction);
        let result = self.apply(&file);
        pipe.close(result.err()).await;
    }

    async fn version(&self) -> DbResult<Version> {
        self.with_conn(|conn| {
            let version = conn
                .query_row(
                    &format!("SELECT version FROM {VERSION_TABLE} ORDER BY version DESC LIMIT 1"),
                    [],
                    |row| row.get::<_, u64>(0),
                )
                .optional()?;
            Ok(version.map(Version::new).unwrap_or(Version::NIL))
        })
    }

    async fn versions(&self) -> DbResult<AppliedVersions> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT version FROM {VERSION_TABLE} ORDER BY version DESC"))?;
            let versions = stmt
                .query_map([], |row| row.get::<_, u64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AppliedVersions::from(versions))
        })
    }

    fn driver_name(&self) -> &'static str {
        DUCKDB_SCHEME
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
