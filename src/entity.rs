//! Table accessors.
//!
//! An [`Entity`] binds one table (or view) of a [`Connection`]. Construction
//! checks that the table exists and snapshots its column metadata; the CRUD
//! helpers build parameterized SQL from [`Record`]s, commit on success and roll
//! back on failure.

use crate::core::db::{schema, Column, Connection, Cursor, Fetch, QueryResult, Record};
use crate::core::{Result, SqlEntityError};
use crate::sql;
use rusqlite::types::Value;
use std::fmt;
use tracing::{debug, warn};

/// A handle bound to one database table.
///
/// The entity borrows its connection and never closes it. Column metadata is
/// captured once at construction and is not refreshed if the schema changes.
pub struct Entity<'c> {
    name: String,
    connection: &'c Connection,
    columns: Vec<Column>,
}

impl<'c> Entity<'c> {
    /// Binds `name` on `connection`.
    ///
    /// # Errors
    ///
    /// Returns `SqlEntityError::NotFound` if the catalog has no table or view
    /// called `name`; no metadata query is issued in that case.
    pub fn new(name: impl Into<String>, connection: &'c Connection) -> Result<Self> {
        let name = name.into();

        if !schema::table_exists(connection, &name)? {
            return Err(SqlEntityError::NotFound(format!(
                "Entity '{}' does not exist for this connection in the database",
                name
            )));
        }

        let columns = schema::table_columns(connection, &name)?;
        connection.refresh_cursor();
        debug!("Bound entity {} with {} column(s)", name, columns.len());

        Ok(Entity {
            name,
            connection,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    /// Column names in catalog order
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Full column metadata in catalog order
    pub fn info(&self) -> &[Column] {
        &self.columns
    }

    /// Declared type of `column`, if the table has it
    pub fn data_type(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.data_type.as_str())
    }

    /// Row count left on the connection's primary cursor by the last statement.
    ///
    /// This reads shared connection state: it reflects whatever ran last,
    /// through this entity or not, and is `None` after a cursor refresh.
    pub fn last_execute_len(&self) -> Option<usize> {
        self.connection.rowcount()
    }

    /// Number of rows in the table, counted on a fresh independent cursor
    pub fn len(&self) -> Result<usize> {
        let mut cursor = self.connection.new_cursor();
        let count = cursor.execute(&sql::select_all(&self.name), &[])?;
        cursor.close();
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Opens an independent cursor for [`Entity::iter`]
    pub fn cursor(&self) -> Cursor<'c> {
        self.connection.new_cursor()
    }

    /// Streams every row of the table through `cursor`.
    ///
    /// The scan is lazy and one-pass; calling `iter` again re-executes the
    /// query.
    ///
    /// ```
    /// use sqlentity::{record, Connection, Entity};
    ///
    /// let conn = Connection::open_in_memory()?;
    /// conn.execute("CREATE TABLE tags (label TEXT)", &[])?;
    /// let tags = Entity::new("tags", &conn)?;
    /// tags.insert(&record! { "label" => "rust".to_string() })?;
    ///
    /// let mut cursor = tags.cursor();
    /// for row in tags.iter(&mut cursor)? {
    ///     println!("{:?}", row?);
    /// }
    /// # Ok::<(), sqlentity::SqlEntityError>(())
    /// ```
    pub fn iter<'a>(&self, cursor: &'a mut Cursor<'c>) -> Result<Fetch<'a>> {
        cursor.query(&sql::select_all(&self.name), &[])
    }

    /// Materializes the whole table
    pub fn get_table(&self) -> Result<QueryResult> {
        self.connection.query(&sql::select_all(&self.name), &[])
    }

    /// Inserts one row built from `fields`, in field order.
    ///
    /// Commits on success. On failure the transaction is rolled back, a
    /// warning is logged and the cause is returned.
    pub fn insert(&self, fields: &Record) -> Result<usize> {
        if fields.is_empty() {
            return self.reject("inserted", SqlEntityError::EmptyRecord("insert"));
        }

        let statement = sql::insert(&self.name, fields.columns());
        let params: Vec<Value> = fields.values().cloned().collect();

        self.transact("inserted", || self.connection.execute(&statement, &params))
    }

    /// Deletes the row whose key column equals the identifier's value.
    ///
    /// # Errors
    ///
    /// `SqlEntityError::InvalidIdentifier` unless `identifier` holds exactly one
    /// column. `SqlEntityError::NotFound` (after rollback) if no row matches.
    pub fn delete(&self, identifier: &Record) -> Result<usize> {
        let (key, value) = match single_key(identifier) {
            Ok(pair) => pair,
            Err(err) => return self.reject("deleted", err),
        };
        let params = [value.clone()];

        self.transact("deleted", || {
            let probe = self.connection.query(&sql::exists(&self.name, key), &params)?;
            let found = matches!(
                probe.rows.first().and_then(|row| row.first()),
                Some(Value::Integer(1))
            );
            if !found {
                return Err(SqlEntityError::NotFound("Record not found to delete".to_string()));
            }
            self.connection.execute(&sql::delete(&self.name, key), &params)
        })
    }

    /// Sets `fields` on the row whose key column equals the identifier's value.
    ///
    /// Matching no row is not an error; the returned count is then zero.
    pub fn update(&self, identifier: &Record, fields: &Record) -> Result<usize> {
        let (key, value) = match single_key(identifier) {
            Ok(pair) => pair,
            Err(err) => return self.reject("updated", err),
        };
        if fields.is_empty() {
            return self.reject("updated", SqlEntityError::EmptyRecord("update"));
        }

        let statement = sql::update(&self.name, fields.columns(), key);
        let params: Vec<Value> = fields
            .values()
            .cloned()
            .chain(std::iter::once(value.clone()))
            .collect();

        self.transact("updated", || self.connection.execute(&statement, &params))
    }

    /// Runs caller-supplied SQL that concerns this entity.
    ///
    /// The only check is that the table name occurs somewhere in `sql`; it is
    /// a plain substring test and not an authorization boundary. Driver
    /// failures roll back before the error is returned.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        if !sql.contains(self.name.as_str()) {
            return Err(SqlEntityError::UnrelatedQuery {
                entity: self.name.clone(),
            });
        }

        self.connection.query(sql, &[]).map_err(|err| {
            if let Err(rollback_err) = self.connection.rollback() {
                warn!("Rollback after failed query on {} failed: {}", self.name, rollback_err);
            }
            warn!("Query Error on {}: {}", self.name, err);
            err
        })
    }

    /// Runs `op`, then commits. Any failure rolls the transaction back.
    fn transact<T>(&self, outcome: &str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        match op().and_then(|value| self.connection.commit().map(|_| value)) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(rollback_err) = self.connection.rollback() {
                    warn!(
                        "Record not {} in {}: {}; rollback also failed: {}",
                        outcome, self.name, err, rollback_err
                    );
                    return Err(err);
                }
                warn!(
                    "Record not {} in {}: {}. The transaction has been rolled back",
                    outcome, self.name, err
                );
                Err(err)
            }
        }
    }

    /// Logs a mutation refused before any SQL ran. The session is left as is.
    fn reject<T>(&self, outcome: &str, err: SqlEntityError) -> Result<T> {
        warn!("Record not {} in {}: {}", outcome, self.name, err);
        Err(err)
    }
}

fn single_key(identifier: &Record) -> Result<(&str, &Value)> {
    identifier.single().ok_or(SqlEntityError::InvalidIdentifier {
        keys: identifier.len(),
    })
}

impl fmt::Display for Entity<'_> {
    /// `name(col1, col2, ...)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.columns().join(", "))
    }
}

impl fmt::Debug for Entity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("connection", &"__hide__")
            .finish()
    }
}
