//! Declaration record and its status vocabulary
//!
//! A declaration is one civil-registration case (birth, death or marriage)
//! tracked in the per-user local store. Form data is an open-ended nested
//! mapping of section → field → value; the engine treats it as opaque.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single form field value
///
/// Closed sum over the shapes country-specific form schemas produce.
/// Untagged so arbitrary nested form JSON round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// String payload, if this value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

/// Fields of one form section
pub type SectionData = BTreeMap<String, FieldValue>;

/// Full form payload: section name → field name → value
pub type DeclarationData = BTreeMap<String, SectionData>;

/// Registration event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Birth,
    Death,
    Marriage,
}

/// Where a declaration sits in the registration pipeline
///
/// `Draft` and the `ReadyTo*` states are the only ones a user-initiated
/// command may target directly; every `*ing` state is entered by the engine
/// as the side effect of issuing the corresponding network action and
/// resolves to a terminal state before the command completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Draft,

    ReadyToSubmit,
    Submitting,
    Submitted,
    Declared,

    ReadyToValidate,
    Validating,
    Validated,

    ReadyToApprove,
    Approving,
    Approved,

    ReadyToRegister,
    Registering,
    Registered,

    ReadyToCertify,
    Certifying,
    Certified,

    ReadyToReject,
    Rejecting,
    Rejected,

    ReadyToArchive,
    Archiving,
    Archived,

    ReadyToReinstate,
    Reinstating,
    Reinstated,

    ReadyToRequestCorrection,
    RequestingCorrection,
    CorrectionRequested,

    Failed,
    FailedNetwork,
}

impl SubmissionStatus {
    /// Whether this client is actively submitting the record (`ReadyTo*` or
    /// `*ing`). The workqueue processing filter drops server entries whose
    /// local copy is in one of these states.
    pub fn is_in_flight(&self) -> bool {
        use SubmissionStatus::*;
        matches!(
            self,
            ReadyToSubmit
                | Submitting
                | ReadyToValidate
                | Validating
                | ReadyToApprove
                | Approving
                | ReadyToRegister
                | Registering
                | ReadyToCertify
                | Certifying
                | ReadyToReject
                | Rejecting
                | ReadyToArchive
                | Archiving
                | ReadyToReinstate
                | Reinstating
                | ReadyToRequestCorrection
                | RequestingCorrection
        )
    }
}

/// Download pipeline status
///
/// Absent on declarations authored locally — they never need remote
/// hydration. At most one declaration across the store is `Downloading`
/// at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadStatus {
    ReadyToDownload,
    Downloading,
    Downloaded,
    Failed,
    FailedNetwork,
}

impl DownloadStatus {
    /// Terminal failure of either kind
    pub fn is_failed(&self) -> bool {
        matches!(self, DownloadStatus::Failed | DownloadStatus::FailedNetwork)
    }
}

/// Server action that produced (or will produce) this record
///
/// Selects the fetch query the remote adapter issues when hydrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Fetch the registered/declared record for review
    LoadReview,
    /// Fetch the record with its requested-correction overlay
    LoadCorrection,
    Archive,
    Reinstate,
}

/// One civil-registration case draft or in-progress submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Client-generated UUID for drafts; server composition id once registered
    pub id: String,
    pub event: Event,
    /// Form payload, opaque to the engine
    #[serde(default)]
    pub data: DeclarationData,
    /// Snapshot taken when the record was downloaded; base for discarding
    /// correction overlays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_data: Option<DeclarationData>,
    pub submission_status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_status: Option<DownloadStatus>,
    #[serde(default)]
    pub download_retry_attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Set by the engine when the record is first stored (epoch ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_on: Option<u64>,
    /// Set by the engine on each modification (epoch ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<u64>,
    /// Other declaration ids the server flagged as potential duplicates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
    /// Server-reported registration status, if the record was downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<String>,
}

impl Declaration {
    /// Brand-new locally authored draft with a client-generated id
    pub fn new_draft(event: Event) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event,
            data: DeclarationData::new(),
            original_data: None,
            submission_status: SubmissionStatus::Draft,
            download_status: None,
            download_retry_attempt: 0,
            action: None,
            saved_on: None,
            modified_on: None,
            duplicates: Vec::new(),
            registration_status: None,
        }
    }

    /// Stub referencing a server-side record that still needs hydration
    /// (e.g. opened from a workqueue entry)
    pub fn stub(id: impl Into<String>, event: Event, action: Action) -> Self {
        Self {
            id: id.into(),
            event,
            data: DeclarationData::new(),
            original_data: None,
            submission_status: SubmissionStatus::Draft,
            download_status: Some(DownloadStatus::ReadyToDownload),
            download_retry_attempt: 0,
            action: Some(action),
            saved_on: None,
            modified_on: None,
            duplicates: Vec::new(),
            registration_status: None,
        }
    }

    /// Fully hydrated review declaration built from a downloaded payload
    ///
    /// `original_data` snapshots the downloaded form so correction overlays
    /// can be discarded later.
    pub fn review(
        id: impl Into<String>,
        event: Event,
        data: DeclarationData,
        registration_status: Option<String>,
        duplicates: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            event,
            original_data: Some(data.clone()),
            data,
            submission_status: SubmissionStatus::Draft,
            download_status: Some(DownloadStatus::Downloaded),
            download_retry_attempt: 0,
            action: None,
            saved_on: None,
            modified_on: None,
            duplicates,
            registration_status,
        }
    }

    /// Whether a download for this record ended in a terminal failure
    pub fn download_failed(&self) -> bool {
        self.download_status.map(|s| s.is_failed()).unwrap_or(false)
    }
}
