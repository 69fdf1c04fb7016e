// src/db.rs
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::persistence::{KeyValueStorage, StorageError};

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
}

const DB_FILE_NAME: &str = "mapty.sqlite";
const APP_DATA_DIR: &str = "mapty";

/// Gets the path to the SQLite database file within the app's data directory.
/// Creates the directory if it doesn't exist.
/// # Errors
/// Returns `DbError::DataDir` if no data directory exists for this platform.
pub fn get_db_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
/// # Errors
/// Returns `DbError::Connection` if the file cannot be opened.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::Connection)
}

/// Creates the key-value table if it doesn't exist.
/// # Errors
/// Returns `DbError::Connection` if the statement fails.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
        [],
    )
    .map_err(DbError::Connection)?;
    Ok(())
}

/// Durable key-value slots backed by one SQLite table.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Wraps an open connection, creating the table if needed.
    /// # Errors
    /// Returns `DbError` if the schema cannot be created.
    pub fn new(conn: Connection) -> Result<Self, DbError> {
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// # Errors
    /// Returns `DbError` if the database cannot be opened or initialised.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Self::new(open_db(path)?)
    }

    /// # Errors
    /// Returns `DbError` if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::new(Connection::open_in_memory()?)
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::QueryFailed)?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(DbError::UpdateFailed)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(DbError::DeleteFailed)?;
        Ok(())
    }
}
