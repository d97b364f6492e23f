//! Storage layer for raktkosh.
//!
//! This module provides an `SQLite`-backed key-value store. Each record
//! family (the signed-in profile, the request ledger, the emergency board)
//! is one JSON document stored under a fixed key. Keys are typed: a
//! [`Slot<T>`] can only be read back as the `T` it was written with.

pub mod migrations;
pub mod schema;

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// A typed key into the store.
///
/// Slots are declared as constants next to the record type they hold.
pub struct Slot<T> {
    key: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Slot<T> {
    /// Declare a slot under `key`.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _record: PhantomData,
        }
    }

    /// The raw key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slot<T> {}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.key).finish()
    }
}

/// Storage engine for raktkosh records.
///
/// All access is synchronous read/modify/write on a single connection.
/// Two processes sharing a database file are last-write-wins.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored in `slot`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored JSON does not
    /// decode as `T`.
    pub fn load<T: DeserializeOwned>(&self, slot: Slot<T>) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                [slot.key()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(text) = raw else {
            debug!("Slot {} is empty", slot.key());
            return Ok(None);
        };

        serde_json::from_str(&text).map(Some).map_err(|source| {
            warn!("Slot {} holds malformed JSON", slot.key());
            Error::SlotCorrupt {
                key: slot.key(),
                source,
            }
        })
    }

    /// Overwrite `slot` with `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    pub fn save<T: Serialize>(&self, slot: Slot<T>, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.conn.execute(
            r"
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![slot.key(), text, Utc::now().to_rfc3339()],
        )?;
        debug!("Wrote {} bytes to slot {}", text.len(), slot.key());
        Ok(())
    }

    /// Delete `slot`. Returns `true` if it held a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove<T>(&self, slot: Slot<T>) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM slots WHERE key = ?1", [slot.key()])?;
        Ok(affected > 0)
    }

    /// Whether `slot` currently holds a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn contains<T>(&self, slot: Slot<T>) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM slots WHERE key = ?1",
            [slot.key()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Read, modify and write back `slot` inside one transaction.
    ///
    /// An absent slot starts from `T::default()`. If `f` fails nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error from `f`, or if the read or write fails.
    pub fn update<T, R, F>(&self, slot: Slot<T>, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut value = self.load(slot)?.unwrap_or_default();
        let outcome = f(&mut value)?;
        self.save(slot, &value)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the database
    /// file cannot be inspected.
    pub fn stats(&self) -> Result<StorageStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, length(value), updated_at FROM slots ORDER BY key")?;
        let slots = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let size_bytes: i64 = row.get(1)?;
                let updated_at: String = row.get(2)?;
                Ok(SlotInfo {
                    key,
                    size_bytes: u64::try_from(size_bytes).unwrap_or(0),
                    updated_at: DateTime::parse_from_rfc3339(&updated_at)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc)),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path)?.len()
        };

        Ok(StorageStats {
            slots,
            db_size_bytes,
        })
    }
}

/// Size and freshness of one stored slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    /// The slot key.
    pub key: String,
    /// Length of the stored JSON in bytes.
    pub size_bytes: u64,
    /// When the slot was last written.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Occupied slots, ordered by key.
    pub slots: Vec<SlotInfo>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Notes {
        lines: Vec<String>,
    }

    const NOTES: Slot<Notes> = Slot::new("notes");
    const COUNTER: Slot<u32> = Slot::new("counter");

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_load_empty_slot() {
        let storage = create_test_storage();
        assert_eq!(storage.load(NOTES).unwrap(), None);
        assert!(!storage.contains(NOTES).unwrap());
    }

    #[test]
    fn test_save_and_load() {
        let storage = create_test_storage();
        let notes = Notes {
            lines: vec!["first".to_string(), "second".to_string()],
        };

        storage.save(NOTES, &notes).unwrap();

        assert!(storage.contains(NOTES).unwrap());
        assert_eq!(storage.load(NOTES).unwrap(), Some(notes));
    }

    #[test]
    fn test_save_overwrites() {
        let storage = create_test_storage();
        storage.save(COUNTER, &1).unwrap();
        storage.save(COUNTER, &2).unwrap();

        assert_eq!(storage.load(COUNTER).unwrap(), Some(2));
        assert_eq!(storage.stats().unwrap().slots.len(), 1);
    }

    #[test]
    fn test_remove() {
        let storage = create_test_storage();
        storage.save(COUNTER, &7).unwrap();

        assert!(storage.remove(COUNTER).unwrap());
        assert!(!storage.remove(COUNTER).unwrap());
        assert_eq!(storage.load(COUNTER).unwrap(), None);
    }

    #[test]
    fn test_slots_are_independent() {
        let storage = create_test_storage();
        storage.save(COUNTER, &3).unwrap();
        storage.save(NOTES, &Notes::default()).unwrap();
        storage.remove(NOTES).unwrap();

        assert_eq!(storage.load(COUNTER).unwrap(), Some(3));
    }

    #[test]
    fn test_load_with_wrong_type_is_corrupt() {
        let storage = create_test_storage();
        storage.save(COUNTER, &5).unwrap();

        let mistyped: Slot<Notes> = Slot::new("counter");
        let err = storage.load(mistyped).unwrap_err();
        assert!(matches!(err, Error::SlotCorrupt { key: "counter", .. }));
    }

    #[test]
    fn test_update_starts_from_default() {
        let storage = create_test_storage();
        let len = storage
            .update(NOTES, |notes| {
                notes.lines.push("hello".to_string());
                Ok(notes.lines.len())
            })
            .unwrap();

        assert_eq!(len, 1);
        assert_eq!(storage.load(NOTES).unwrap().unwrap().lines, vec!["hello"]);
    }

    #[test]
    fn test_update_failure_writes_nothing() {
        let storage = create_test_storage();
        storage.save(COUNTER, &10).unwrap();

        let result: Result<()> = storage.update(COUNTER, |n| {
            *n += 1;
            Err(Error::internal("abort"))
        });

        assert!(result.is_err());
        assert_eq!(storage.load(COUNTER).unwrap(), Some(10));
    }

    #[test]
    fn test_stats_lists_slots() {
        let storage = create_test_storage();
        storage.save(COUNTER, &1).unwrap();
        storage.save(NOTES, &Notes::default()).unwrap();

        let stats = storage.stats().unwrap();
        let keys: Vec<_> = stats.slots.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["counter", "notes"]);
        assert!(stats.slots.iter().all(|s| s.updated_at.is_some()));
        assert_eq!(stats.slots[0].size_bytes, 1);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_slot_debug_and_key() {
        assert_eq!(NOTES.key(), "notes");
        assert_eq!(format!("{NOTES:?}"), "Slot(\"notes\")");
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_persists() {
        let db_path = std::env::temp_dir().join(format!(
            "raktkosh_storage_test_{}.db",
            std::process::id()
        ));

        {
            let storage = Storage::open(&db_path).unwrap();
            storage.save(COUNTER, &42).unwrap();
            assert_eq!(storage.path(), db_path);
            assert!(storage.stats().unwrap().db_size_bytes > 0);
        }

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.load(COUNTER).unwrap(), Some(42));

        drop(reopened);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_stats_reports_missing_database_file() {
        let db_path = std::env::temp_dir().join(format!(
            "raktkosh_stats_test_{}.db",
            std::process::id()
        ));
        let storage = Storage::open(&db_path).unwrap();
        std::fs::remove_file(&db_path).unwrap();

        assert!(matches!(storage.stats(), Err(Error::Io(_))));

        drop(storage);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("raktkosh_test_{}", std::process::id()));
        let nested_path = root.join("nested/db.sqlite");
        let _ = std::fs::remove_dir_all(&root);

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        let _ = std::fs::remove_dir_all(&root);
    }
}
