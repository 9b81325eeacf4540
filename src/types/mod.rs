//! Core data model for the sync engine

mod declaration;
mod user;
mod workqueue;

pub use declaration::{
    Action, Declaration, DeclarationData, DownloadStatus, Event, FieldValue, SectionData,
    SubmissionStatus,
};
pub use user::{Role, UserDetails, UserRecord};
pub use workqueue::{
    BucketMap, CaseSummary, PageParams, Workqueue, WorkqueueBucket, WorkqueueKind, WorkqueueQuery,
};
