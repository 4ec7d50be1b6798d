//! Database layer for helpdesk.
//!
//! Provides a `Database` struct that owns the SQLite connection and hands
//! out the records store for the `facility_data` table.

mod model;
mod records;

pub use model::{Department, HelpRecord, Location, RecordId, Section, StoredRecord};
pub use records::{Records, StoreError};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The main database struct that owns the SQLite connection.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the default location.
    ///
    /// The default location is `~/.local/share/helpdesk/helpdesk.db`.
    pub fn open() -> Result<Self, StoreError> {
        let db_path = Self::default_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        Self::open_at(&db_path)
    }

    /// Open or create a database at a specific path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("helpdesk")
            .join("helpdesk.db")
    }

    /// Access the records store.
    ///
    /// The connection is locked for the lifetime of the returned handle, so
    /// callers must not hold it across a prompt suspension.
    pub fn records(&self) -> Records<'_> {
        let conn = self.conn.lock().expect("Database lock poisoned");
        Records::new(conn)
    }

    /// Initialize the database schema. Idempotent.
    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS facility_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                department TEXT NOT NULL,
                section TEXT,
                location TEXT NOT NULL,
                details TEXT NOT NULL
            );
            "#,
        )
    }
}
