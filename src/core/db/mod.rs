/// Database Module
///
/// This module provides the connection layer sqlentity builds its table
/// accessors on.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): session, primary cursor state and transactions
/// - **Cursors** (`cursor.rs`): independent scoped statement handles for scans and counts
/// - **Schema Introspection** (`schema.rs`): catalog lookups for tables and columns
/// - **Query Execution** (`query.rs`): parameter binding and result shapes
/// - **Records** (`record.rs`): ordered column/value maps used as mutation input
///
/// ## Error Handling
///
/// All database operations use the standardized `SqlEntityError` type for consistent error propagation.
pub mod connection;
pub mod cursor;
pub mod query;
pub mod record;
pub mod schema;

pub use connection::*;
pub use cursor::*;
pub use query::*;
pub use record::*;
pub use schema::*;

pub use rusqlite::types::Value;
