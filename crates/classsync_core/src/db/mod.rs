//! Cache database bootstrap.
//!
//! # Responsibility
//! - Open the SQLite file (or in-memory database) holding cache entries.
//! - Bring its schema up to date before any entry is read.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A cache file written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or migrating the cache database.
#[derive(Debug)]
pub enum DbError {
    /// The directory meant to hold the cache file cannot be created.
    CacheDir { path: PathBuf, message: String },
    Sqlite(rusqlite::Error),
    /// The cache file carries a schema this build does not know.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable code used in `db_open` log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CacheDir { .. } => "cache_dir_unavailable",
            Self::Sqlite(_) => "sqlite_failed",
            Self::SchemaTooNew { .. } => "cache_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheDir { path, message } => write!(
                f,
                "cannot create cache directory `{}`: {message}",
                path.display()
            ),
            Self::Sqlite(err) => write!(f, "cache database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "cache file uses schema {found} but this build only knows up to {supported}; reset the cache or upgrade"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CacheDir { .. } | Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
