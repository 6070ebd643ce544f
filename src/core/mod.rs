/// Core Module for sqlentity
///
/// This module contains the connection layer and the shared error type the
/// table accessors are built on.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{Result, SqlEntityError};
