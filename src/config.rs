use crate::core::{Result, SqlEntityError};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::OpenFlags;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

static PRAGMA_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid pragma name pattern"));

/// Connection parameters passed to [`crate::core::db::Connection::new`].
///
/// Every field except `database` has a default, so a config file only needs
/// to name the database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Path to the database file, `:memory:`, or a `file:` URI
    pub database: String,
    /// Open the database read-only
    pub read_only: bool,
    /// Create the database file if it does not exist
    pub create: bool,
    /// How long to wait on a locked database before failing
    pub busy_timeout_ms: Option<u64>,
    /// `PRAGMA foreign_keys` setting applied after open
    pub foreign_keys: Option<bool>,
    /// Run every statement in its own implicit transaction
    pub autocommit: bool,
    /// Extra pragmas applied after open, in name order
    pub pragmas: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            database: ":memory:".to_string(),
            read_only: false,
            create: true,
            busy_timeout_ms: None,
            foreign_keys: None,
            autocommit: false,
            pragmas: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(database: impl Into<String>) -> Self {
        ConnectionConfig {
            database: database.into(),
            ..Default::default()
        }
    }

    /// Configuration for a private in-memory database
    pub fn memory() -> Self {
        ConnectionConfig::default()
    }

    /// Driver open flags derived from `read_only` and `create`
    pub fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }

    /// Checks the parts of the configuration the driver would otherwise
    /// interpolate into SQL text.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(SqlEntityError::Config("database must not be empty".to_string()));
        }
        for (name, value) in &self.pragmas {
            if !PRAGMA_NAME.is_match(name) {
                return Err(SqlEntityError::Config(format!("invalid pragma name '{}'", name)));
            }
            if value.contains(';') {
                return Err(SqlEntityError::Config(format!(
                    "invalid value for pragma '{}': {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Loads connection configuration from a file.
///
/// Files ending in `.json` are parsed as JSON, anything else as TOML.
///
/// # Example
///
/// ```no_run
/// let config = sqlentity::config::load_config("sqlentity.toml")?;
/// println!("{:?}", config);
/// # Ok::<(), sqlentity::core::SqlEntityError>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConnectionConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let config: ConnectionConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content).map_err(|e| SqlEntityError::Config(e.to_string()))?,
    };

    config.validate()?;
    Ok(config)
}
