/// Query Execution Module
///
/// This module provides parameter binding and the result shape shared by every
/// read path: a header of column names in result order followed by one row per
/// returned record.

use crate::core::{Result, SqlEntityError};
use rusqlite::{
    params_from_iter,
    types::{Value, ValueRef},
    Batch, Connection, Statement,
};
use std::fmt;

/// A single result row, one value per column in result order
pub type Row = Vec<Value>;

/// Represents the result of a SQL query execution
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows of data
    pub rows: Vec<Row>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new QueryResult from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        QueryResult {
            columns,
            rows,
            row_count,
        }
    }

    /// The column-name tuple that heads the result
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Returns `true` when no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the result, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Looks up a single cell by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}

impl fmt::Display for QueryResult {
    /// Prints the header tuple, then one tuple per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self.columns.iter().map(|c| format!("'{}'", c)).collect();
        write!(f, "({})", header.join(", "))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| format_value(v.into())).collect();
            write!(f, "\n({})", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Prepares `sql` and checks that `params` fills every placeholder
///
/// # Errors
///
/// Returns `SqlEntityError::Query` if the statement cannot be prepared or if
/// `sql` holds more than one statement, and
/// `SqlEntityError::ParameterMismatch` if the parameter count differs from
/// the statement's placeholder count.
pub(crate) fn prepare_bound<'c>(
    conn: &'c Connection,
    sql: &str,
    params: &[Value],
) -> Result<Statement<'c>> {
    let mut batch = Batch::new(conn, sql);
    let stmt = batch
        .next()
        .map_err(|e| SqlEntityError::Query(format!("Failed to prepare statement: {}", e)))?
        .ok_or_else(|| SqlEntityError::Query("Failed to prepare statement: no SQL statement given".to_string()))?;

    // Blank or comment-only tails yield nothing; anything else is a second statement.
    if !matches!(batch.next(), Ok(None)) {
        return Err(SqlEntityError::Query(
            "Only one SQL statement can be executed at a time".to_string(),
        ));
    }

    let expected = stmt.parameter_count();
    if expected != params.len() {
        return Err(SqlEntityError::ParameterMismatch {
            expected,
            actual: params.len(),
        });
    }

    Ok(stmt)
}

/// Runs a prepared statement that produces no rows, returning the changed row count
pub(crate) fn execute_bound(stmt: &mut Statement<'_>, params: &[Value]) -> Result<usize> {
    stmt.execute(params_from_iter(params.iter()))
        .map_err(|e| SqlEntityError::Query(format!("Statement execution failed: {}", e)))
}

/// Runs a prepared statement and materializes every row
pub(crate) fn collect_rows(stmt: &mut Statement<'_>, params: &[Value]) -> Result<QueryResult> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| read_row(row, width))
        .map_err(|e| SqlEntityError::Query(format!("Query execution failed: {}", e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SqlEntityError::Query(format!("Result processing failed: {}", e)))?;

    Ok(QueryResult::new(columns, rows))
}

/// Copies the first `width` columns of a driver row into an owned `Row`
pub(crate) fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Row> {
    (0..width).map(|i| row.get::<_, Value>(i)).collect()
}

/// Formats a SQLite value as a tuple literal
fn format_value(value: ValueRef) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => format!("'{}'", String::from_utf8_lossy(t)),
        ValueRef::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_test_table(conn: &Connection) {
        conn.execute_batch(
            "
            CREATE TABLE test (
                id INTEGER PRIMARY KEY,
                name TEXT,
                value REAL
            );
            INSERT INTO test (name, value) VALUES ('Alice', 123.5);
            INSERT INTO test (name, value) VALUES ('Bob', 678.25);
            INSERT INTO test (name, value) VALUES (NULL, NULL);
        ",
        )
        .unwrap();
    }

    #[test]
    fn test_collect_rows() {
        let conn = Connection::open_in_memory().unwrap();
        setup_test_table(&conn);

        let mut stmt = prepare_bound(&conn, "SELECT * FROM test ORDER BY id", &[]).unwrap();
        let result = collect_rows(&mut stmt, &[]).unwrap();

        assert_eq!(result.header(), vec!["id", "name", "value"]);
        assert_eq!(result.row_count, 3);
        assert_eq!(
            result.rows[0],
            vec![
                Value::Integer(1),
                Value::Text("Alice".to_string()),
                Value::Real(123.5)
            ]
        );
        assert_eq!(result.rows[2], vec![Value::Integer(3), Value::Null, Value::Null]);
        assert_eq!(result.get(1, "name"), Some(&Value::Text("Bob".to_string())));
        assert_eq!(result.get(7, "name"), None);
    }

    #[test]
    fn test_parameter_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        setup_test_table(&conn);

        let result = prepare_bound(&conn, "SELECT * FROM test WHERE id = ?1", &[]);
        match result {
            Err(SqlEntityError::ParameterMismatch { expected, actual }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            _ => panic!("Expected ParameterMismatch error"),
        }
    }

    #[test]
    fn test_prepare_error_handling() {
        let conn = Connection::open_in_memory().unwrap();

        match prepare_bound(&conn, "SELECT * FROM nonexistent_table", &[]) {
            Err(SqlEntityError::Query(msg)) => assert!(msg.contains("no such table")),
            _ => panic!("Expected Query error"),
        };
    }

    #[test]
    fn test_multiple_statements_are_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        setup_test_table(&conn);

        match prepare_bound(&conn, "DELETE FROM test WHERE id = 1; DELETE FROM test", &[]) {
            Err(SqlEntityError::Query(msg)) => assert!(msg.contains("one SQL statement")),
            _ => panic!("Expected Query error"),
        }
        match prepare_bound(&conn, "SELECT 1; SELEC garbage", &[]) {
            Err(SqlEntityError::Query(msg)) => assert!(msg.contains("one SQL statement")),
            _ => panic!("Expected Query error"),
        }
        assert!(matches!(prepare_bound(&conn, "", &[]), Err(SqlEntityError::Query(_))));

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM test", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_trailing_semicolon_and_comment_are_accepted() {
        let conn = Connection::open_in_memory().unwrap();
        setup_test_table(&conn);

        assert!(prepare_bound(&conn, "SELECT * FROM test;", &[]).is_ok());
        assert!(prepare_bound(&conn, "SELECT * FROM test; -- trailing note\n", &[]).is_ok());
    }

    #[test]
    fn test_execute_bound_reports_changes() {
        let conn = Connection::open_in_memory().unwrap();
        setup_test_table(&conn);

        let params = [Value::Text("Carol".to_string())];
        let mut stmt = prepare_bound(&conn, "UPDATE test SET name = ?1 WHERE name IS NULL", &params).unwrap();
        assert_eq!(execute_bound(&mut stmt, &params).unwrap(), 1);
    }

    #[test]
    fn test_display_prints_header_then_rows() {
        let result = QueryResult::new(
            vec!["id".to_string(), "data".to_string()],
            vec![
                vec![Value::Integer(1), Value::Text("b".to_string())],
                vec![Value::Integer(2), Value::Blob(vec![0x48, 0x69])],
            ],
        );

        assert_eq!(result.to_string(), "('id', 'data')\n(1, 'b')\n(2, <BLOB: 2 bytes>)");
    }
}
