//! SQLite-backed persistent cache store.
//!
//! # Responsibility
//! - Persist cache entries across sessions in the `cache_entries` table.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - One row per rendered key; writes replace the previous payload.
//! - Every access goes through the connection mutex, so writes from
//!   concurrent orchestrations are serialized and last write wins.

use super::{CacheError, CacheResult, CacheStore};
use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    /// Opens (or creates) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a throwaway in-memory cache database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Lists keys grouped under one namespace (e.g. `campus`).
    pub fn keys_in_namespace(&self, namespace: &str) -> CacheResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT cache_key FROM cache_entries WHERE namespace = ?1 ORDER BY cache_key ASC;",
        )?;
        let rows = stmt.query_map([namespace], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

impl CacheStore for SqliteCacheStore {
    fn read_text(&self, key: &str) -> CacheResult<Option<String>> {
        let conn = self.lock()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM cache_entries WHERE cache_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_text(&self, key: &str, namespace: &str, text: &str) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cache_entries (cache_key, namespace, payload, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(cache_key) DO UPDATE SET
                namespace = excluded.namespace,
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, namespace, text],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM cache_entries WHERE cache_key = ?1;", [key])?;
        Ok(changed > 0)
    }

    fn list_keys(&self) -> CacheResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT cache_key FROM cache_entries ORDER BY cache_key ASC;")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }

    fn retain_only(&self, keep: &[String]) -> CacheResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existing = {
            let mut stmt = tx.prepare("SELECT cache_key FROM cache_entries;")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut keys = Vec::new();
            for key in rows {
                keys.push(key?);
            }
            keys
        };

        let mut removed = 0;
        for key in existing.iter().filter(|key| !keep.contains(key)) {
            removed += tx.execute("DELETE FROM cache_entries WHERE cache_key = ?1;", [key])?;
        }
        tx.commit()?;
        Ok(removed)
    }
}
