// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;
pub mod entity;
pub mod sql;

#[cfg(test)]
mod test_utils;

pub use crate::config::{load_config, ConnectionConfig};
pub use crate::core::db::{Column, Connection, Cursor, Fetch, QueryResult, Record, Row, Value};
pub use crate::core::{Result, SqlEntityError};
pub use crate::entity::Entity;
