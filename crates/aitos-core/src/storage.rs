//! Local persistence adapter
//!
//! Every store in the dashboard persists a whole JSON-encoded list under a
//! single key. Writes replace the whole value; there are no transactions that
//! span keys and no schema versioning.

use crate::error::{DashboardError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Key for the quick-access command history (capped at 50 entries)
pub const COMMAND_HISTORY_KEY: &str = "oss-bot-history";
/// Key for the full conversation log (capped at 100 entries)
pub const CONVERSATION_LOG_KEY: &str = "oss-bot-conversations";
pub const TEAM_MEMBERS_KEY: &str = "ait-os-team-members";
pub const TASKS_KEY: &str = "ait-os-tasks";

/// A string key/value store with replace-whole-value semantics
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store: a single `kv` table in one database file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DashboardError::LockPoisoned)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory store, used by tests and as a fallback when the database cannot be opened
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| DashboardError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| DashboardError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| DashboardError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Read a list, distinguishing "never written" (`Ok(None)`) from unreadable data (`Err`)
pub fn read_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<Vec<T>>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Read a list, treating missing or corrupt data as empty
pub fn load_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    match read_list(store, key) {
        Ok(Some(items)) => items,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable list");
            Vec::new()
        }
    }
}

pub fn write_list<T: Serialize>(store: &dyn KeyValueStore, key: &str, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_set_get_replace_remove() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "[1]").unwrap();
        store.set("k", "[2]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[2]"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dashboard.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            write_list(&store, TASKS_KEY, &["a".to_string(), "b".to_string()]).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let items: Vec<String> = load_list(&store, TASKS_KEY);
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_load_list_treats_corrupt_data_as_empty() {
        let store = MemoryStore::new();
        store.set(COMMAND_HISTORY_KEY, "{not json").unwrap();

        let items: Vec<String> = load_list(&store, COMMAND_HISTORY_KEY);
        assert!(items.is_empty());
        assert!(read_list::<String>(&store, COMMAND_HISTORY_KEY).is_err());
    }

    #[test]
    fn test_read_list_missing_key() {
        let store = MemoryStore::new();
        assert!(read_list::<String>(&store, TASKS_KEY).unwrap().is_none());
    }
}
