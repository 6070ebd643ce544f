/// # Test Utilities Module
///
/// Isolated in-memory database fixtures for the unit tests.

use crate::config::ConnectionConfig;
use crate::core::db::{Connection, Value};
use crate::core::Result;

/// Isolated database test fixture
pub struct DatabaseFixture {
    pub connection: Connection,
}

impl DatabaseFixture {
    /// Create a new empty in-memory database
    pub fn new() -> Result<Self> {
        let config = ConnectionConfig {
            foreign_keys: Some(true),
            ..ConnectionConfig::memory()
        };
        Ok(DatabaseFixture {
            connection: Connection::new(&config)?,
        })
    }

    /// Create fixture with a populated `users` table
    pub fn with_sample_data() -> Result<Self> {
        let fixture = Self::new()?;
        fixture.setup_standard_schema()?;
        fixture.populate_sample_data()?;
        fixture.connection.refresh_cursor();
        Ok(fixture)
    }

    /// Set up standard test schema
    pub fn setup_standard_schema(&self) -> Result<()> {
        self.connection.execute(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT UNIQUE,
                active INTEGER NOT NULL DEFAULT 1
            )",
            &[],
        )?;
        self.connection.commit()
    }

    /// Populate test data: two active users and one inactive
    pub fn populate_sample_data(&self) -> Result<()> {
        let users = [
            (1, "alice", "alice@example.com", 1),
            (2, "bob", "bob@example.com", 1),
            (3, "carol", "carol@example.com", 0),
        ];
        for (id, username, email, active) in users {
            self.connection.execute(
                "INSERT INTO users (id, username, email, active) VALUES (?1, ?2, ?3, ?4)",
                &[
                    Value::Integer(id),
                    Value::Text(username.to_string()),
                    Value::Text(email.to_string()),
                    Value::Integer(active),
                ],
            )?;
        }
        self.connection.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creation() {
        let fixture = DatabaseFixture::with_sample_data().unwrap();
        let result = fixture.connection.query("SELECT COUNT(*) FROM users", &[]).unwrap();
        assert_eq!(result.rows[0][0], Value::Integer(3));
    }
}
