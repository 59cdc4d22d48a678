//! Database module for Keepsake
//!
//! Provides SQLite storage for memory records.

pub mod memories;
pub mod schema;

use crate::error::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// Database handle owning the SQLite connection.
///
/// Constructed once at process start and passed into the API server; the
/// connection is closed when the handle is dropped at shutdown.
pub struct Database {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn new(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        schema::init_db(&conn)?;

        Ok(Database {
            conn: Mutex::new(conn),
            path: db_path,
        })
    }

    /// Open an in-memory database (tests)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_db(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    /// Run a closure against the connection.
    ///
    /// SQLite serializes writes; the mutex keeps handler access exclusive
    /// without any application-level locking beyond it.
    pub async fn with_conn<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Connection) -> T,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Get the database file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

// Re-export schema init for convenience
pub use schema::init_db;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test_keepsake.db");

        let db = Database::new(db_path.clone());
        assert!(db.is_ok());
        assert_eq!(db.unwrap().path(), &db_path);
    }

    #[tokio::test]
    async fn test_with_conn() {
        let db = Database::in_memory().unwrap();
        let n: i64 = db
            .with_conn(|conn| conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap())
            .await;
        assert_eq!(n, 1);
    }
}
