//! Remote fetch adapter.
//!
//! # Responsibility
//! - Attach the bearer credential to every request.
//! - Defeat intermediate caches on reads with a monotonically distinct
//!   `_ts` query parameter.
//! - Surface every non-success status as one error shape carrying the code
//!   and response body text.
//!
//! # Invariants
//! - This layer never reads or writes the cache.
//! - Requests without a credential fail before touching the network.
//! - Credentials and bodies are never logged.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Url;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub mod endpoints;
mod http;

pub use endpoints::Endpoint;
pub use http::HttpTransport;

/// Query parameter appended to reads to defeat intermediate caching.
pub const CACHE_BUSTER_PARAM: &str = "_ts";

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No bearer credential is available; terminal for the current screen.
    MissingCredential,
    /// The backend answered with a non-success status.
    Status { code: u16, body: String },
    /// The request never produced a response.
    Transport(String),
    /// The response body is not JSON.
    Decode(String),
    InvalidUrl(String),
}

impl RemoteError {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }

    /// Stable code used in log events and degraded rows.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Status { .. } => "http_status",
            Self::Transport(_) => "transport_failed",
            Self::Decode(_) => "decode_failed",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "no credential available; sign in again"),
            Self::Status { code, body } if body.is_empty() => write!(f, "request failed with status {code}"),
            Self::Status { code, body } => write!(f, "request failed with status {code}: {body}"),
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Decode(message) => write!(f, "invalid response body: {message}"),
            Self::InvalidUrl(message) => write!(f, "invalid request url: {message}"),
        }
    }
}

impl Error for RemoteError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    pub fn is_read(self) -> bool {
        self == Self::Get
    }
}

/// Fully prepared request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub bearer: String,
    pub body: Option<Value>,
}

/// Raw response: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Wire-level request execution.
///
/// Implementations only move bytes; status interpretation and JSON decoding
/// stay in [`RemoteClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> RemoteResult<TransportResponse>;
}

/// Authenticated JSON client over a [`Transport`].
pub struct RemoteClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
    last_cache_buster: AtomicU64,
}

impl RemoteClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> RemoteResult<Self> {
        let mut base_url =
            Url::parse(base_url.trim()).map_err(|err| RemoteError::InvalidUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(format!(
                "`{base_url}` cannot be used as a base url"
            )));
        }
        // Endpoint segments are appended, so a trailing slash would double up.
        let trimmed_path = base_url.path().trim_end_matches('/').to_string();
        base_url.set_path(&trimmed_path);

        Ok(Self {
            base_url,
            transport,
            last_cache_buster: AtomicU64::new(0),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issues one request and decodes the JSON response.
    ///
    /// An empty success body decodes to `Value::Null`.
    pub async fn fetch(
        &self,
        credential: Option<&str>,
        method: Method,
        endpoint: &Endpoint,
        body: Option<Value>,
    ) -> RemoteResult<Value> {
        let bearer = match credential.map(str::trim) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                warn!(
                    "event=remote_request module=remote status=error method={} path={} error_code=missing_credential",
                    method.as_str(),
                    endpoint.path()
                );
                return Err(RemoteError::MissingCredential);
            }
        };

        let url = self.build_url(method, endpoint)?;
        let started_at = Instant::now();
        debug!(
            "event=remote_request module=remote status=start method={} path={}",
            method.as_str(),
            endpoint.path()
        );

        let response = match self
            .transport
            .send(PreparedRequest {
                method,
                url,
                bearer,
                body,
            })
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=remote_request module=remote status=error method={} path={} duration_ms={} error_code={}",
                    method.as_str(),
                    endpoint.path(),
                    started_at.elapsed().as_millis(),
                    err.code()
                );
                return Err(err);
            }
        };

        if !response.is_success() {
            warn!(
                "event=remote_request module=remote status=error method={} path={} duration_ms={} error_code=http_status status_code={}",
                method.as_str(),
                endpoint.path(),
                started_at.elapsed().as_millis(),
                response.status
            );
            return Err(RemoteError::Status {
                code: response.status,
                body: response.body,
            });
        }

        debug!(
            "event=remote_request module=remote status=ok method={} path={} duration_ms={} status_code={}",
            method.as_str(),
            endpoint.path(),
            started_at.elapsed().as_millis(),
            response.status
        );
        decode_body(&response.body)
    }

    pub async fn get(&self, credential: Option<&str>, endpoint: &Endpoint) -> RemoteResult<Value> {
        self.fetch(credential, Method::Get, endpoint, None).await
    }

    /// Builds the absolute request url, adding the cache buster on reads.
    pub fn build_url(&self, method: Method, endpoint: &Endpoint) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(endpoint.segments());
        }

        let mut query: Vec<(String, String)> = endpoint.query().to_vec();
        if method.is_read() {
            query.push((
                CACHE_BUSTER_PARAM.to_string(),
                self.next_cache_buster().to_string(),
            ));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Wall-clock milliseconds, bumped so consecutive values never repeat.
    fn next_cache_buster(&self) -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        let mut next = now_ms;
        let _ = self
            .last_cache_buster
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                next = now_ms.max(last + 1);
                Some(next)
            });
        next
    }
}

fn decode_body(body: &str) -> RemoteResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| RemoteError::Decode(err.to_string()))
}
