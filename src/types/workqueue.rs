//! Workqueue snapshot types
//!
//! A workqueue is a paginated, bucketed snapshot of server-classified case
//! lists relevant to the current user's role. Buckets hold display summaries,
//! not full declarations. The snapshot is replaced wholesale on each
//! successful fetch; on failure the previous snapshot is retained and the
//! `error` flag is set.

use super::declaration::Event;
use super::user::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-side case bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkqueueKind {
    InProgress,
    Notification,
    Review,
    Reject,
    Approval,
    Print,
    ExternalValidation,
}

/// Display summary of one case in a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: String,
    pub event: Event,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

/// One page of one bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkqueueBucket {
    pub total_items: u32,
    #[serde(default)]
    pub results: Vec<CaseSummary>,
}

/// Buckets keyed by kind, as returned by the paginated search
pub type BucketMap = BTreeMap<WorkqueueKind, WorkqueueBucket>;

/// Cached workqueue snapshot for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workqueue {
    /// Last fetch failed; buckets below are the retained previous snapshot
    #[serde(default)]
    pub error: bool,
    /// At least one fetch has ever succeeded
    #[serde(default)]
    pub initial_synced: bool,
    #[serde(default)]
    pub buckets: BucketMap,
}

impl Workqueue {
    pub fn bucket(&self, kind: WorkqueueKind) -> Option<&WorkqueueBucket> {
        self.buckets.get(&kind)
    }

    /// Replace the snapshot wholesale after a successful fetch
    pub fn replace(&mut self, buckets: BucketMap) {
        self.buckets = buckets;
        self.error = false;
        self.initial_synced = true;
    }

    /// Keep the previous snapshot but flag it as stale
    pub fn mark_failed(&mut self) {
        self.error = true;
    }
}

/// Per-bucket pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    pub skip: u32,
    pub page_size: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            skip: 0,
            page_size: 10,
        }
    }
}

/// Parameters for the paginated workqueue search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkqueueQuery {
    pub user_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    /// Pagination per bucket; buckets not listed use the default window
    #[serde(default)]
    pub pages: BTreeMap<WorkqueueKind, PageParams>,
}

impl WorkqueueQuery {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            location_id: None,
            pages: BTreeMap::new(),
        }
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_page(mut self, kind: WorkqueueKind, page: PageParams) -> Self {
        self.pages.insert(kind, page);
        self
    }
}
