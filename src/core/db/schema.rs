/// Schema Introspection Module
///
/// Catalog lookups used when binding a table: whether a table or view exists,
/// and the ordered column metadata SQLite reports for it. All lookups run as
/// parameterized queries through the [`Connection`], so they leave their row
/// count on the primary cursor like any other statement.

use super::connection::Connection;
use super::query::Row;
use crate::core::{Result, SqlEntityError};
use rusqlite::types::Value;

// pragma_table_list covers main, temp and attached schemas.
const TABLE_EXISTS_SQL: &str = "SELECT EXISTS(
    SELECT 1 FROM pragma_table_list WHERE type IN ('table', 'view') AND name = ?1
)";

const TABLE_COLUMNS_SQL: &str =
    "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid";

const LIST_TABLES_SQL: &str = "SELECT DISTINCT name FROM pragma_table_list
    WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
    ORDER BY name";

/// Represents a database column with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type as written in the table definition (may be empty)
    pub data_type: String,
    /// Whether the column is declared NOT NULL
    pub notnull: bool,
    /// Whether this column is part of the primary key
    pub pk: bool,
    /// Default value expression (if any)
    pub dflt_value: Option<String>,
}

impl Column {
    /// Creates a Column from a `pragma_table_info` row
    fn from_catalog_row(row: &Row) -> Result<Self> {
        match row.as_slice() {
            [name, data_type, notnull, dflt_value, pk] => Ok(Column {
                name: text(name)?,
                data_type: text(data_type)?,
                notnull: flag(notnull),
                pk: flag(pk),
                dflt_value: match dflt_value {
                    Value::Null => None,
                    other => Some(text(other)?),
                },
            }),
            _ => Err(SqlEntityError::Query(format!(
                "unexpected column metadata row with {} fields",
                row.len()
            ))),
        }
    }
}

/// Checks whether `table` names a table or view in the catalog
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let result = conn.query(TABLE_EXISTS_SQL, &[Value::Text(table.to_string())])?;
    Ok(result.rows.first().and_then(|row| row.first()).map(flag).unwrap_or(false))
}

/// Retrieves column metadata for `table` in declaration order
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<Column>> {
    let result = conn.query(TABLE_COLUMNS_SQL, &[Value::Text(table.to_string())])?;
    result.rows.iter().map(Column::from_catalog_row).collect()
}

/// Lists user tables and views by name
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let result = conn.query(LIST_TABLES_SQL, &[])?;
    result
        .rows
        .iter()
        .filter_map(|row| row.first())
        .map(text)
        .collect()
}

fn text(value: &Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        other => Err(SqlEntityError::Query(format!(
            "expected text in catalog row, got {:?}",
            other
        ))),
    }
}

fn flag(value: &Value) -> bool {
    matches!(value, Value::Integer(i) if *i != 0)
}
