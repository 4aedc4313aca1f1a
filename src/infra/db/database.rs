//! SQLite database setup and connection management for review records.
//! Opens the shared connection; the `reviews` table itself is created and
//! dropped through [`ReviewRepository`](super::ReviewRepository).

use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::repository::{self, DbConn, ReviewRepository, SqliteEmployeeLookup};
use crate::infra::app_config::{self, AppConfig};

/// Database wrapper that manages the shared SQLite connection
pub struct Database {
    conn: DbConn,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database described by the user config
    pub fn open() -> Result<Self> {
        Self::open_with_config(&app_config::load_config())
    }

    pub fn open_with_config(config: &AppConfig) -> Result<Self> {
        Self::open_file(config.resolved_database_path(), config.enforce_foreign_keys)
    }

    /// Create an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        };
        db.set_foreign_keys(false)?;
        Ok(db)
    }

    /// Create or open the database at a specific path, foreign keys off
    pub fn open_at(path: PathBuf) -> Result<Self> {
        Self::open_file(path, false)
    }

    fn open_file(path: PathBuf, enforce_foreign_keys: bool) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        log::debug!("Opened review database at {}", path.display());
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        };
        db.set_foreign_keys(enforce_foreign_keys)?;
        Ok(db)
    }

    /// Bundled SQLite builds may default to enforcing foreign keys, so the
    /// setting is always applied explicitly.
    fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let conn = repository::lock(&self.conn);
        let pragma = if enabled {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        };
        conn.execute_batch(pragma)?;
        Ok(())
    }

    /// Whether SQLite currently enforces foreign keys on this connection
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let conn = repository::lock(&self.conn);
        let enabled: i64 = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
        Ok(enabled == 1)
    }

    /// Get a reference to the connection
    pub fn connection(&self) -> DbConn {
        self.conn.clone()
    }

    /// Path backing this database, `None` for in-memory databases
    pub fn path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    /// Employee existence check against the `employee` table on this connection
    pub fn employee_lookup(&self) -> SqliteEmployeeLookup {
        SqliteEmployeeLookup::new(self.connection())
    }

    /// Start a review unit of work validating employees against this database
    pub fn review_repo(&self) -> ReviewRepository<SqliteEmployeeLookup> {
        ReviewRepository::new(self.connection(), self.employee_lookup())
    }
}
