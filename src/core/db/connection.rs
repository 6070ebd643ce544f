/// Connection Management Module
///
/// This module wraps a SQLite session together with the state of its primary
/// cursor, and owns transaction control for everything built on top of it.

use super::cursor::Cursor;
use super::query::{collect_rows, execute_bound, prepare_bound, QueryResult};
use crate::config::ConnectionConfig;
use crate::core::{Result, SqlEntityError};
use rusqlite::types::Value;
use rusqlite::Statement;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

/// Represents database transaction states
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransactionState {
    /// No active transaction (autocommit mode)
    #[default]
    Autocommit,
    /// Transaction in progress
    Transaction,
}

/// State of the connection's primary cursor
#[derive(Debug, Clone, Copy)]
struct CursorState {
    id: u64,
    /// Rows produced or changed by the most recent statement, if any ran
    rowcount: Option<usize>,
}

/// A database session plus its single primary cursor.
///
/// Methods take `&self` so any number of [`crate::Entity`] values can borrow
/// one connection; the primary cursor lives in a `RefCell`, which also keeps
/// the type `!Sync`. A connection is meant to be driven by one caller at a
/// time.
pub struct Connection {
    conn: rusqlite::Connection,
    primary: RefCell<CursorState>,
    next_cursor_id: Cell<u64>,
    autocommit: bool,
}

impl Connection {
    /// Opens a session using the supplied connection parameters
    ///
    /// # Errors
    ///
    /// Returns `SqlEntityError::Config` for an invalid configuration and
    /// `SqlEntityError::Connection` (carrying the driver cause) if the session
    /// cannot be established or initialized.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        info!("Opening database: {}", config.database);

        let conn = rusqlite::Connection::open_with_flags(&config.database, config.open_flags())
            .and_then(|conn| configure_session(&conn, config).map(|_| conn))
            .map_err(|source| {
                error!("Connection Fail: {}: {}", config.database, source);
                SqlEntityError::Connection {
                    target: config.database.clone(),
                    source,
                }
            })?;

        Ok(Connection {
            conn,
            primary: RefCell::new(CursorState { id: 0, rowcount: None }),
            next_cursor_id: Cell::new(1),
            autocommit: config.autocommit,
        })
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Connection::new(&ConnectionConfig::memory())
    }

    /// The underlying driver session
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Runs a parameterized statement that returns no rows
    ///
    /// Parameters are bound positionally. The number of changed rows is
    /// returned and recorded as the primary cursor's row count.
    ///
    /// # Errors
    ///
    /// Returns `SqlEntityError::ParameterMismatch` if `params` does not fill the
    /// statement's placeholders, `SqlEntityError::Query` if preparing or running
    /// the statement fails.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!("execute: {}", sql);
        let mut stmt = prepare_bound(&self.conn, sql, params)?;
        self.begin_implicit(&stmt)?;

        let changed = execute_bound(&mut stmt, params)?;
        self.primary.borrow_mut().rowcount = Some(changed);
        Ok(changed)
    }

    /// Runs a parameterized statement that returns rows
    ///
    /// # Returns
    ///
    /// A `QueryResult` whose header lists the result columns in order, followed
    /// by one row per record. The row count is recorded on the primary cursor.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::execute`].
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        debug!("query: {}", sql);
        let mut stmt = prepare_bound(&self.conn, sql, params)?;
        self.begin_implicit(&stmt)?;

        let result = collect_rows(&mut stmt, params)?;
        self.primary.borrow_mut().rowcount = Some(result.row_count);
        Ok(result)
    }

    /// Commits the open transaction, if there is one
    pub fn commit(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| SqlEntityError::Transaction(format!("Commit failed: {}", e)))?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the open transaction, if there is one
    pub fn rollback(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| SqlEntityError::Transaction(format!("Rollback failed: {}", e)))?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Gets the current transaction state
    pub fn transaction_state(&self) -> TransactionState {
        if self.conn.is_autocommit() {
            TransactionState::Autocommit
        } else {
            TransactionState::Transaction
        }
    }

    /// Closes the primary cursor, then the session
    pub fn close(self) -> Result<()> {
        let cursor_id = self.primary.borrow().id;
        debug!("Closing primary cursor {}", cursor_id);
        self.conn.close().map_err(|(_, e)| SqlEntityError::Database(e))?;
        info!("Connection closed");
        Ok(())
    }

    /// Replaces the primary cursor with a fresh one
    ///
    /// The row count left behind by earlier statements is discarded.
    pub fn refresh_cursor(&self) {
        let id = self.allocate_cursor_id();
        let mut primary = self.primary.borrow_mut();
        debug!("Refreshing primary cursor {} -> {}", primary.id, id);
        *primary = CursorState { id, rowcount: None };
    }

    /// Opens a cursor independent of the primary one
    pub fn new_cursor(&self) -> Cursor<'_> {
        Cursor::open(self, self.allocate_cursor_id())
    }

    /// Row count of the most recent statement run on the primary cursor
    ///
    /// `None` until a statement runs after open or [`Connection::refresh_cursor`].
    pub fn rowcount(&self) -> Option<usize> {
        self.primary.borrow().rowcount
    }

    /// Identifier of the current primary cursor
    pub fn cursor_id(&self) -> u64 {
        self.primary.borrow().id
    }

    /// Opens a transaction before the first statement that may write.
    ///
    /// Read-only statements, including BEGIN/COMMIT/ROLLBACK themselves, never
    /// trigger one.
    pub(crate) fn begin_implicit(&self, stmt: &Statement<'_>) -> Result<()> {
        if self.autocommit || stmt.readonly() || !self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| SqlEntityError::Transaction(format!("Begin failed: {}", e)))?;
        debug!("Transaction started");
        Ok(())
    }

    fn allocate_cursor_id(&self) -> u64 {
        let id = self.next_cursor_id.get();
        self.next_cursor_id.set(id + 1);
        id
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &"__hide__")
            .finish_non_exhaustive()
    }
}

/// Applies the session settings from the configuration
fn configure_session(conn: &rusqlite::Connection, config: &ConnectionConfig) -> rusqlite::Result<()> {
    if let Some(ms) = config.busy_timeout_ms {
        conn.busy_timeout(Duration::from_millis(ms))?;
    }
    if let Some(enabled) = config.foreign_keys {
        conn.pragma_update(None, "foreign_keys", enabled)?;
    }
    for (name, value) in &config.pragmas {
        // Some pragmas echo their new value as a row.
        let mut stmt = conn.prepare(&format!("PRAGMA {} = {}", name, value))?;
        let mut rows = stmt.query([])?;
        while rows.next()?.is_some() {}
    }
    Ok(())
}
