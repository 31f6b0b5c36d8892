//! Local session store.
//!
//! A single SQLite file keeps the session row and the device row. The schema
//! is versioned through `PRAGMA user_version`.

mod schema;
mod session;

pub use schema::*;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session store version {found} is newer than this client supports")]
    UnsupportedVersion { found: i64 },
}

pub type DbResult<T> = Result<T, DbError>;

/// Handle to the session store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the store at `path` and bring its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::migrated(Connection::open(path)?)
    }

    /// Throwaway store, used by tests and by clients without a data directory.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> DbResult<Self> {
        let db = Self { conn };
        let found = db.schema_version()?;
        if found > SCHEMA_VERSION {
            return Err(DbError::UnsupportedVersion { found });
        }
        if found < SCHEMA_VERSION {
            db.conn.execute_batch(SCHEMA)?;
            db.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(db)
    }

    pub fn schema_version(&self) -> DbResult<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_store_is_current() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert_eq!(tables, vec!["device".to_string(), "session".to_string()]);
    }

    #[test]
    fn test_newer_store_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
                .unwrap();
        }

        let err = Database::open(&path).err().unwrap();
        assert!(matches!(err, DbError::UnsupportedVersion { found } if found == SCHEMA_VERSION + 1));
    }
}
