use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::KvBackend;
use crate::error::StorageError;

/// SQLite-file backend with a single `kv` table.
///
/// A connection is opened per operation so the backend stays `Send` and the
/// file can be shared with other tools while the client runs.
#[derive(Debug, Clone)]
pub struct SqliteKv {
    db_path: PathBuf,
}

impl SqliteKv {
    /// Open (creating if needed) the database at `db_path`.
    pub fn open<P: Into<PathBuf>>(db_path: P) -> Result<Self, StorageError> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// `<data_dir>/parley/chat.db`
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            StorageError::Unavailable("Could not determine data directory".to_string())
        })?;
        Ok(data_dir.join("parley").join("chat.db"))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn init(&self) -> Result<(), StorageError> {
        self.connect()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KvBackend for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .connect()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.connect()?.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.connect()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.connect()?.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}
