//! Remote case service adapter
//!
//! Typed surface over the case-management gateway: fetch-by-declaration and
//! the paginated workqueue search. Errors distinguish "network unreachable"
//! from "request rejected" so the download queue can classify terminal
//! failures.

mod http;

pub use http::{GatewayCaseService, GatewayConfig};

use crate::error::RemoteError;
use crate::types::{Action, BucketMap, Event, WorkqueueQuery};
use async_trait::async_trait;

/// Issues typed network requests against the case-management service
#[async_trait]
pub trait RemoteCaseService: Send + Sync {
    /// Fetch the full server payload for one declaration. The `action`
    /// selects which query the gateway runs.
    async fn fetch_declaration(
        &self,
        event: Event,
        action: Action,
        id: &str,
    ) -> Result<serde_json::Value, RemoteError>;

    /// Paginated, role-scoped workqueue search
    async fn search_workqueues(&self, query: &WorkqueueQuery) -> Result<BucketMap, RemoteError>;
}
