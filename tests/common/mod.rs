//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use caseflow_sdk::remote::RemoteCaseService;
use caseflow_sdk::store::InMemoryStore;
use caseflow_sdk::transform::PassthroughTransformer;
use caseflow_sdk::{
    Action, BucketMap, EngineConfig, EngineEvent, Event, RemoteError, SyncEngine, WorkqueueQuery,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub type TestEngine = SyncEngine<InMemoryStore, ScriptedRemote, PassthroughTransformer>;

/// Remote fake that replays scripted responses and logs every fetch
#[derive(Clone, Default)]
pub struct ScriptedRemote {
    fetches: Arc<Mutex<VecDeque<Result<Value, RemoteError>>>>,
    searches: Arc<Mutex<VecDeque<Result<BucketMap, RemoteError>>>>,
    fetch_log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_fetch_ok(&self, payload: Value) {
        self.fetches.lock().unwrap().push_back(Ok(payload));
    }

    pub fn push_fetch_err(&self, err: RemoteError) {
        self.fetches.lock().unwrap().push_back(Err(err));
    }

    pub fn push_search_ok(&self, buckets: BucketMap) {
        self.searches.lock().unwrap().push_back(Ok(buckets));
    }

    pub fn push_search_err(&self, err: RemoteError) {
        self.searches.lock().unwrap().push_back(Err(err));
    }

    /// Ids fetched so far, in issuance order
    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteCaseService for ScriptedRemote {
    async fn fetch_declaration(
        &self,
        _event: Event,
        _action: Action,
        id: &str,
    ) -> Result<Value, RemoteError> {
        self.fetch_log.lock().unwrap().push(id.to_string());
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RemoteError::Rejected {
                    status: 599,
                    message: "fetch script exhausted".into(),
                })
            })
    }

    async fn search_workqueues(&self, _query: &WorkqueueQuery) -> Result<BucketMap, RemoteError> {
        self.searches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::NetworkUnreachable("search script exhausted".into())))
    }
}

/// Engine wired to in-memory storage and the scripted remote
pub fn engine_with(
    store: InMemoryStore,
    remote: ScriptedRemote,
) -> (TestEngine, mpsc::UnboundedReceiver<EngineEvent>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(
        "u1",
        store,
        remote,
        PassthroughTransformer,
        EngineConfig::default(),
        events_tx,
    );
    (engine, events_rx)
}

/// Server payload in the passthrough shape
pub fn birth_payload(first_name: &str) -> Value {
    json!({
        "data": {
            "child": {
                "first_name": first_name,
                "family_name": "Bell",
                "birth_date": "2026-03-01"
            },
            "informant": { "contact_number": "+26077000001" }
        },
        "registration_status": "DECLARED",
        "duplicates": []
    })
}

pub fn rejected() -> RemoteError {
    RemoteError::Rejected {
        status: 500,
        message: "workflow error".into(),
    }
}

pub fn unreachable() -> RemoteError {
    RemoteError::NetworkUnreachable("connection refused".into())
}

/// Drain every event currently in the channel
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
