use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::bridge::{Broadcaster, Subscription};
use crate::error::{Result, StoreError};

/// String key-value storage shared by every tab of the application.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let storage = SqliteStorage {
            conn: Mutex::new(Connection::open(path)?),
        };
        storage.initialize()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let storage = SqliteStorage {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        storage.initialize()?;
        Ok(storage)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )?;

        Ok(())
    }
}

impl fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            rusqlite::params![key, value],
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;

        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;

        Ok(())
    }
}

/// Map-backed storage with an optional byte quota, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any write that would push keys plus values past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        MemoryStorage {
            entries: Mutex::default(),
            quota: Some(bytes),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StoreError::QuotaExceeded { key: key.to_string() });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Identifies one open view context ("tab") over a shared [`StorageArea`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(uuid::Uuid);

impl TabId {
    pub fn new() -> Self {
        TabId(uuid::Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Cross-tab change signal: `key` was written or removed by `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: TabId,
}

/// A storage backend shared between tabs, raising a [`StorageEvent`] on every change.
#[derive(Clone)]
pub struct StorageArea {
    backend: Arc<dyn KeyValueStorage>,
    events: Broadcaster<StorageEvent>,
}

impl fmt::Debug for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageArea")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl StorageArea {
    pub fn new(backend: impl KeyValueStorage + 'static) -> Self {
        StorageArea {
            backend: Arc::new(backend),
            events: Broadcaster::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.backend.get(key)
    }

    pub fn set(&self, origin: TabId, key: &str, value: &str) -> Result<()> {
        self.backend.set(key, value)?;
        self.events.publish(StorageEvent {
            key: key.to_string(),
            origin,
        });
        Ok(())
    }

    pub fn remove(&self, origin: TabId, key: &str) -> Result<()> {
        self.backend.remove(key)?;
        self.events.publish(StorageEvent {
            key: key.to_string(),
            origin,
        });
        Ok(())
    }

    pub fn subscribe(&self) -> Subscription<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_set_overwrites_and_remove_deletes() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.get("eps_sales").unwrap(), None);

        storage.set("eps_sales", "[]").unwrap();
        storage.set("eps_sales", "[1]").unwrap();
        assert_eq!(storage.get("eps_sales").unwrap().as_deref(), Some("[1]"));

        storage.remove("eps_sales").unwrap();
        assert_eq!(storage.get("eps_sales").unwrap(), None);
    }

    #[test]
    fn sqlite_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("eps_admin.db");

        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.set("eps_inventory", "[]").unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.get("eps_inventory").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn memory_quota_rejects_oversized_writes() {
        let storage = MemoryStorage::with_quota(32);
        storage.set("eps_sales", "[]").unwrap();

        let err = storage.set("eps_sales", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { ref key } if key == "eps_sales"));
        assert_eq!(storage.get("eps_sales").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn area_reports_writes_with_origin() {
        let area = StorageArea::in_memory();
        let events = area.subscribe();
        let tab = TabId::new();

        area.set(tab, "eps_concerns", "[]").unwrap();
        area.remove(tab, "adminUser").unwrap();

        assert_eq!(
            events.try_recv(),
            Some(StorageEvent {
                key: "eps_concerns".to_string(),
                origin: tab
            })
        );
        assert_eq!(events.try_recv().map(|e| e.key), Some("adminUser".to_string()));
    }

    #[test]
    fn failed_write_raises_no_event() {
        let area = StorageArea::new(MemoryStorage::with_quota(4));
        let events = area.subscribe();

        assert!(area.set(TabId::new(), "eps_sales", "[]").is_err());
        assert_eq!(events.try_recv(), None);
    }
}
