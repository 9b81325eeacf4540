//! Caseflow SDK - client sync engine for civil registration
//!
//! Keeps a per-user local store of civil-registration declarations (birth,
//! death, marriage) consistent with a remote case-management service on
//! field-deployed clients with unreliable connectivity.
//!
//! # Architecture
//!
//! - **Lifecycle state machine**: user commands (store, modify, delete,
//!   archive, reinstate, clear-correction) apply pure transitions over the
//!   in-memory record and return an ordered effect list.
//! - **Download queue**: single-flight, FIFO, bounded-retry hydration of
//!   declarations referenced from workqueue entries.
//! - **Workqueue reconciler**: merges paginated server buckets with locally
//!   authoritative state so in-flight records are never double-shown.
//! - **User record store**: per-user persistence over an injected
//!   string-keyed durable store.
//!
//! All synchronization is pull/command driven; every command executes its
//! side effects one at a time, so at most one network call and one storage
//! call are ever in flight on behalf of this engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use caseflow_sdk::{Declaration, EngineConfig, Event, SyncEngine};
//! use caseflow_sdk::remote::{GatewayCaseService, GatewayConfig};
//! use caseflow_sdk::store::FileStore;
//! use caseflow_sdk::transform::PassthroughTransformer;
//!
//! let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut engine = SyncEngine::new(
//!     "user-1",
//!     FileStore::new("/data/caseflow"),
//!     GatewayCaseService::new(GatewayConfig::default()),
//!     PassthroughTransformer,
//!     EngineConfig::default(),
//!     events_tx,
//! );
//!
//! engine.hydrate().await?;
//! engine.store_declaration(Declaration::new_draft(Event::Birth)).await;
//! ```

// Core data model
pub mod types;

// Error types
pub mod error;

// Durable persistence and the per-user record store
pub mod store;

// Declaration lifecycle state machine
pub mod lifecycle;

// Download queue controller
pub mod queue;

// Workqueue reconciliation
pub mod workqueue;

// Remote case service adapter
pub mod remote;

// Form/transform collaborator seam
pub mod transform;

// Engine runner
pub mod engine;

// Re-export the data model
pub use types::{
    Action, BucketMap, CaseSummary, Declaration, DeclarationData, DownloadStatus, Event,
    FieldValue, PageParams, Role, SectionData, SubmissionStatus, UserDetails, UserRecord,
    Workqueue, WorkqueueBucket, WorkqueueKind, WorkqueueQuery,
};

// Re-export error types
pub use error::{EngineError, RemoteError, Result, StoreError};

// Re-export the engine surface
pub use engine::{EngineConfig, EngineEvent, SavedCallback, SyncEngine};

// Re-export lifecycle vocabulary
pub use lifecycle::{Command, Effect};

// Re-export the adapter surfaces
pub use remote::{GatewayCaseService, GatewayConfig, RemoteCaseService};
pub use store::{DurableStore, FileStore, InMemoryStore, UserRecordStore};
pub use transform::{DisplayFields, FormTransformer, PassthroughTransformer, TransformedCase};

/// Current time as epoch milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
