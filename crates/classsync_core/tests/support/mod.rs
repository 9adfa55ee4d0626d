//! In-process backend double for orchestration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use classsync_core::cache::{self, CacheKey, CacheStore, MemoryCacheStore};
use classsync_core::remote::{
    Method, PreparedRequest, RemoteClient, RemoteError, RemoteResult, Transport, TransportResponse,
};
use classsync_core::Orchestrator;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const BASE_URL: &str = "https://backend.test/api";

enum Reply {
    Status(u16, String),
    Unreachable(String),
}

/// Answers requests from a route table keyed by method and path.
///
/// Paths are relative to [`BASE_URL`], e.g. `/courses`. Query strings are
/// ignored for routing. Unknown routes answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    seen: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
        let text = if body.is_null() { String::new() } else { body.to_string() };
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Reply::Status(status, text));
    }

    pub fn unreachable(&self, method: Method, path: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Reply::Unreachable(message.to_string()));
    }

    /// Holds responses for `path` until the returned handle is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<PreparedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && relative_path(request) == path)
            .collect()
    }
}

fn relative_path(request: &PreparedRequest) -> String {
    request
        .url
        .path()
        .strip_prefix("/api")
        .unwrap_or(request.url.path())
        .to_string()
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> RemoteResult<TransportResponse> {
        let path = relative_path(&request);
        let method = request.method;
        self.seen.lock().unwrap().push(request);

        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(&(method, path.clone())) {
            Some(Reply::Status(status, body)) => Ok(TransportResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(Reply::Unreachable(message)) => Err(RemoteError::Transport(message.clone())),
            None => Ok(TransportResponse {
                status: 404,
                body: format!("no route for {} {path}", method.as_str()),
            }),
        }
    }
}

/// Orchestrator over a fresh memory cache, signed in, campus `north` selected.
pub fn signed_in_engine(transport: &Arc<ScriptedTransport>) -> (Orchestrator, Arc<MemoryCacheStore>) {
    let (engine, store) = anonymous_engine(transport);
    engine.set_credential("token-1").unwrap();
    engine.select_campus("north").unwrap();
    (engine, store)
}

pub fn anonymous_engine(transport: &Arc<ScriptedTransport>) -> (Orchestrator, Arc<MemoryCacheStore>) {
    let store = Arc::new(MemoryCacheStore::new());
    let remote = RemoteClient::new(BASE_URL, transport.clone()).unwrap();
    let engine = Orchestrator::new(store.clone(), remote);
    (engine, store)
}

pub fn seed(store: &MemoryCacheStore, key: CacheKey, value: Value) {
    cache::set_typed(store, &key, &value).unwrap();
}

pub fn read(store: &MemoryCacheStore, key: &CacheKey) -> Option<Value> {
    store.get(key)
}
