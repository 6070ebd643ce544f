/// Cursor Module
///
/// Independent, scoped statement handles. A `Cursor` owns at most one prepared
/// statement and its own row count, so scans and counts never touch the
/// primary cursor of the [`Connection`] they borrow. The statement is released
/// when the cursor is closed or dropped.

use super::connection::Connection;
use super::query::{execute_bound, prepare_bound, read_row, Row};
use crate::core::{Result, SqlEntityError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Statement};
use tracing::{debug, trace};

pub struct Cursor<'c> {
    connection: &'c Connection,
    id: u64,
    rowcount: Option<usize>,
    stmt: Option<Statement<'c>>,
}

impl<'c> Cursor<'c> {
    pub(crate) fn open(connection: &'c Connection, id: u64) -> Self {
        debug!("Opened cursor {}", id);
        Cursor {
            connection,
            id,
            rowcount: None,
            stmt: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Row count of the last [`Cursor::execute`], if any
    pub fn rowcount(&self) -> Option<usize> {
        self.rowcount
    }

    /// Runs a statement to completion and returns its row count.
    ///
    /// For statements that change data this is the number of changed rows. For
    /// row-returning statements every row is stepped over and counted, but no
    /// column data is read.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let stmt = self.prepare(sql, params)?;

        let count = if stmt.column_count() == 0 {
            execute_bound(stmt, params)?
        } else {
            let mut rows = stmt
                .query(params_from_iter(params.iter()))
                .map_err(|e| SqlEntityError::Query(format!("Query execution failed: {}", e)))?;
            let mut count = 0;
            while rows
                .next()
                .map_err(|e| SqlEntityError::Query(format!("Fetch failed: {}", e)))?
                .is_some()
            {
                count += 1;
            }
            count
        };

        self.rowcount = Some(count);
        Ok(count)
    }

    /// Executes a row-returning statement and hands back a lazy row stream.
    ///
    /// Each call re-executes the statement; the returned [`Fetch`] is
    /// forward-only and spent once it yields `None`.
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Fetch<'_>> {
        let stmt = self.prepare(sql, params)?;
        let width = stmt.column_count();
        let rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|e| SqlEntityError::Query(format!("Query execution failed: {}", e)))?;

        Ok(Fetch {
            rows,
            width,
            fetched: 0,
        })
    }

    /// Closes the cursor, releasing its statement
    pub fn close(self) {}

    fn prepare(&mut self, sql: &str, params: &[Value]) -> Result<&mut Statement<'c>> {
        trace!("cursor {}: {}", self.id, sql);
        // Drop any previous statement before preparing the next one.
        self.stmt = None;
        let connection = self.connection;
        let stmt = prepare_bound(connection.raw(), sql, params)?;
        connection.begin_implicit(&stmt)?;
        Ok(self.stmt.insert(stmt))
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        debug!("Closed cursor {}", self.id);
    }
}

/// Lazy, one-pass stream of rows from a [`Cursor::query`].
///
/// Every `next()` fetches exactly one row from the driver.
pub struct Fetch<'s> {
    rows: rusqlite::Rows<'s>,
    width: usize,
    fetched: usize,
}

impl Fetch<'_> {
    /// Number of rows yielded so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Fetches the next row, or `None` once the stream is exhausted
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        self.next().transpose()
    }
}

impl Iterator for Fetch<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => {
                self.fetched += 1;
                Some(read_row(row, self.width).map_err(SqlEntityError::from))
            }
            Ok(None) => None,
            Err(e) => Some(Err(SqlEntityError::Query(format!("Fetch failed: {}", e)))),
        }
    }
}
