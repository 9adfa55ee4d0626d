//! Reconciliation orchestrator core.
//!
//! # Responsibility
//! - Own the injected cache store and remote client for all screens.
//! - Hydrate screens from the cache first, then refresh from the backend.
//! - Act as the only writer of cache entries.
//!
//! # Invariants
//! - A missing credential is terminal for the screen that needs the network.
//! - Transport failures degrade to cached data, never to an aborted screen.
//! - Results launched for a superseded campus selection are never written.

use super::selection::{SelectionTicket, SelectionTracker};
use crate::cache::{self, CacheError, CacheKey, CacheStore};
use crate::remote::{RemoteClient, RemoteError};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug)]
pub enum OrchestratorError {
    /// No credential is stored; the screen should show a sign-in banner.
    MissingCredential,
    /// The screen needs a campus but none is selected.
    NoCampusSelected,
    /// The campus selection changed while the request was in flight.
    Superseded { launched_for: Option<String> },
    Remote(RemoteError),
    Cache(CacheError),
    NotFound(String),
}

impl Display for OrchestratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "not signed in: no credential available"),
            Self::NoCampusSelected => write!(f, "no campus selected"),
            Self::Superseded { launched_for } => write!(
                f,
                "result discarded: campus selection changed from `{}`",
                launched_for.as_deref().unwrap_or("-")
            ),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
        }
    }
}

impl Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for OrchestratorError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::MissingCredential => Self::MissingCredential,
            other => Self::Remote(other),
        }
    }
}

impl From<CacheError> for OrchestratorError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// Where the data handed to a screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Cache,
    Remote,
}

impl DataOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Remote => "remote",
        }
    }
}

/// Screen data plus provenance.
///
/// `refresh_error` is set when a refresh was attempted and failed; `data`
/// then holds whatever the cache had, possibly nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated<T> {
    pub data: T,
    pub origin: DataOrigin,
    pub refresh_error: Option<RemoteError>,
}

impl<T> Hydrated<T> {
    pub fn cached(data: T) -> Self {
        Self {
            data,
            origin: DataOrigin::Cache,
            refresh_error: None,
        }
    }

    pub fn remote(data: T) -> Self {
        Self {
            data,
            origin: DataOrigin::Remote,
            refresh_error: None,
        }
    }

    pub fn stale(data: T, error: RemoteError) -> Self {
        Self {
            data,
            origin: DataOrigin::Cache,
            refresh_error: Some(error),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.refresh_error.is_some()
    }
}

/// Per-screen coordinator over the cache store and remote client.
pub struct Orchestrator {
    pub(super) cache: Arc<dyn CacheStore>,
    pub(super) remote: RemoteClient,
    pub(super) selection: SelectionTracker,
}

impl Orchestrator {
    /// Creates an orchestrator; the campus selection is restored from cache.
    pub fn new(cache: Arc<dyn CacheStore>, remote: RemoteClient) -> Self {
        let selection = SelectionTracker::new(cache::get_typed::<String>(
            cache.as_ref(),
            &CacheKey::CurrentCampus,
        ));
        Self {
            cache,
            remote,
            selection,
        }
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    pub fn current_campus(&self) -> Option<String> {
        self.selection.current()
    }

    /// Switches the current campus and persists the choice.
    ///
    /// Requests still in flight for the previous campus will discard their
    /// results.
    pub fn select_campus(&self, campus_id: &str) -> OrchestratorResult<()> {
        let campus_id = campus_id.trim().to_string();
        if self.selection.select(Some(campus_id.clone())) {
            info!(
                "event=campus_select module=orchestrator status=ok campus_id={}",
                campus_id
            );
        }
        cache::set_typed(self.cache(), &CacheKey::CurrentCampus, &campus_id)?;
        Ok(())
    }

    /// Stores an already-issued credential.
    pub fn set_credential(&self, token: &str) -> OrchestratorResult<()> {
        cache::store_credential(self.cache(), token)?;
        Ok(())
    }

    pub fn clear_credential(&self) -> OrchestratorResult<()> {
        self.cache.remove(&CacheKey::AuthToken)?;
        Ok(())
    }

    /// Clears all cached data except the credential.
    pub fn reset_cache(&self) -> OrchestratorResult<usize> {
        let removed = self.cache.reset_preserving_credential()?;
        self.selection.select(None);
        info!(
            "event=cache_reset module=orchestrator status=ok removed={}",
            removed
        );
        Ok(removed)
    }

    pub(super) fn credential(&self) -> OrchestratorResult<String> {
        cache::read_credential(self.cache()).ok_or(OrchestratorError::MissingCredential)
    }

    pub(super) fn require_campus(&self, ticket: &SelectionTicket) -> OrchestratorResult<String> {
        ticket
            .campus_id
            .clone()
            .ok_or(OrchestratorError::NoCampusSelected)
    }

    /// Fails with `Superseded` when the selection changed since `ticket`.
    pub(super) fn ensure_current(&self, ticket: &SelectionTicket, screen: &str) -> OrchestratorResult<()> {
        if self.selection.is_current(ticket) {
            return Ok(());
        }
        info!(
            "event=screen_load module=orchestrator screen={} status=discarded launched_for={}",
            screen,
            ticket.campus_id.as_deref().unwrap_or("-")
        );
        Err(OrchestratorError::Superseded {
            launched_for: ticket.campus_id.clone(),
        })
    }

    /// Best-effort cache write; failures are logged, never returned.
    pub(super) fn write_back<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> bool {
        match cache::set_typed(self.cache(), key, value) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=cache_write module=orchestrator status=error key={} error={}",
                    key, err
                );
                false
            }
        }
    }
}

/// Unwraps a single-record `{data: {...}}` envelope.
pub(super) fn unwrap_record(payload: &serde_json::Value) -> &serde_json::Value {
    match payload.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    }
}
