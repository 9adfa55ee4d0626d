//! Persistent cache store contracts.
//!
//! # Responsibility
//! - Define the injected key-value cache interface used by the orchestrator.
//! - Decode persisted JSON leniently: missing or corrupt entries read as a miss.
//!
//! # Invariants
//! - Stores persist JSON text; a value that fails to parse is never surfaced
//!   as an error to readers.
//! - `reset_preserving_credential` never removes `CacheKey::AuthToken`.

use crate::db::DbError;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod keys;
mod memory_store;
mod sqlite_store;

pub use keys::{CacheKey, CACHE_KEY_VERSION};
pub use memory_store::MemoryCacheStore;
pub use sqlite_store::SqliteCacheStore;

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache storage failure. Reads never produce this for corrupt payloads.
#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    Encode(String),
    LockPoisoned,
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(message) => write!(f, "failed to encode cache value: {message}"),
            Self::LockPoisoned => write!(f, "cache store lock poisoned"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw text storage over the namespaced key space.
///
/// Implementors only move strings around; JSON decoding and the corrupt-entry
/// policy live in the provided methods so every store behaves the same.
pub trait CacheStore: Send + Sync {
    fn read_text(&self, key: &str) -> CacheResult<Option<String>>;
    fn write_text(&self, key: &str, namespace: &str, text: &str) -> CacheResult<()>;
    fn delete(&self, key: &str) -> CacheResult<bool>;
    /// Returns all stored keys in ascending order.
    fn list_keys(&self) -> CacheResult<Vec<String>>;
    /// Removes every entry whose key is not in `keep`; returns removed count.
    fn retain_only(&self, keep: &[String]) -> CacheResult<usize>;

    /// Reads and decodes one entry.
    ///
    /// Storage failures and unparsable payloads are logged and read as `None`.
    fn get(&self, key: &CacheKey) -> Option<Value> {
        let rendered = key.render();
        let text = match self.read_text(&rendered) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!(
                    "event=cache_read module=cache status=error key={} error={}",
                    rendered, err
                );
                return None;
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=cache_read module=cache status=degraded key={} error_code=corrupt_entry error={}",
                    rendered, err
                );
                None
            }
        }
    }

    /// Encodes and stores one entry, replacing any previous value.
    fn set(&self, key: &CacheKey, value: &Value) -> CacheResult<()> {
        let text =
            serde_json::to_string(value).map_err(|err| CacheError::Encode(err.to_string()))?;
        self.write_text(&key.render(), key.namespace(), &text)
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        self.delete(&key.render())
    }

    /// Clears every entry except the auth credential.
    fn reset_preserving_credential(&self) -> CacheResult<usize> {
        self.retain_only(&[CacheKey::AuthToken.render()])
    }
}

/// Reads one entry and deserializes it into `T`.
///
/// A value whose shape does not match `T` is treated like a corrupt entry.
pub fn get_typed<T: DeserializeOwned>(store: &dyn CacheStore, key: &CacheKey) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(err) => {
            warn!(
                "event=cache_read module=cache status=degraded key={} error_code=shape_mismatch error={}",
                key, err
            );
            None
        }
    }
}

/// Like [`get_typed`], returning `T::default()` on a miss.
pub fn get_or_default<T: DeserializeOwned + Default>(store: &dyn CacheStore, key: &CacheKey) -> T {
    get_typed(store, key).unwrap_or_default()
}

/// Serializes `value` and stores it under `key`.
pub fn set_typed<T: Serialize + ?Sized>(
    store: &dyn CacheStore,
    key: &CacheKey,
    value: &T,
) -> CacheResult<()> {
    let encoded = serde_json::to_value(value).map_err(|err| CacheError::Encode(err.to_string()))?;
    store.set(key, &encoded)
}

/// Reads the stored bearer credential.
///
/// Accepts a bare JSON string or an object exposing `token`/`accessToken`.
/// Blank credentials read as absent.
pub fn read_credential(store: &dyn CacheStore) -> Option<String> {
    let token = match store.get(&CacheKey::AuthToken)? {
        Value::String(token) => token,
        Value::Object(map) => ["token", "accessToken"]
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_str))
            .map(str::to_string)?,
        _ => return None,
    };
    let trimmed = token.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn store_credential(store: &dyn CacheStore, token: &str) -> CacheResult<()> {
    store.set(&CacheKey::AuthToken, &Value::String(token.trim().to_string()))
}
