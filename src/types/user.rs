//! Per-user partition of local state

use super::declaration::{Declaration, DownloadStatus};
use super::workqueue::{Workqueue, WorkqueueKind};
use serde::{Deserialize, Serialize};

/// Caller role, drives which workqueue buckets are fetched and reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    FieldAgent,
    Registrar,
}

impl Role {
    /// Bucket set visible to this role
    pub fn workqueue_buckets(&self) -> &'static [WorkqueueKind] {
        match self {
            Role::FieldAgent => &[WorkqueueKind::Review, WorkqueueKind::Reject],
            Role::Registrar => &[
                WorkqueueKind::InProgress,
                WorkqueueKind::Notification,
                WorkqueueKind::Review,
                WorkqueueKind::Reject,
            ],
        }
    }
}

/// Authenticated user identity, read-only from this engine's perspective
///
/// Lives under the `USER_DETAILS` key in the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub user_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

/// One user's declarations and cached workqueue snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workqueue: Option<Workqueue>,
}

impl UserRecord {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            declarations: Vec::new(),
            workqueue: None,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Declaration> {
        self.declarations.iter_mut().find(|d| d.id == id)
    }

    /// Replace an existing declaration in place or append a new one.
    /// In-place replacement preserves list order, which is what gives the
    /// download queue its FIFO-of-eligibility behavior.
    pub fn upsert(&mut self, declaration: Declaration) {
        match self.find_mut(&declaration.id) {
            Some(existing) => *existing = declaration,
            None => self.declarations.push(declaration),
        }
    }

    /// Remove a declaration by id; returns whether anything was removed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.declarations.len();
        self.declarations.retain(|d| d.id != id);
        self.declarations.len() != before
    }

    /// The declaration currently being downloaded, unique by invariant
    pub fn downloading(&self) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.download_status == Some(DownloadStatus::Downloading))
    }
}
