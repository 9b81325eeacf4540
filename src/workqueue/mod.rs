//! Workqueue reconciliation
//!
//! Merges a freshly fetched, bucketed server snapshot with locally known
//! declaration state so buckets never show a case this client already holds
//! a more current view of: display fields are rewritten from local data, and
//! entries the client is actively submitting are dropped from the page and
//! its total.

use crate::transform::FormTransformer;
use crate::types::{BucketMap, Declaration, Role, WorkqueueBucket};
use tracing::debug;

/// Reconcile a server snapshot against local declarations
///
/// Only the buckets visible to `role` are touched; anything else in the
/// snapshot passes through unchanged.
pub fn reconcile(
    mut buckets: BucketMap,
    declarations: &[Declaration],
    role: Role,
    transformer: &impl FormTransformer,
) -> BucketMap {
    for kind in role.workqueue_buckets() {
        if let Some(bucket) = buckets.get_mut(kind) {
            overwrite_display_fields(bucket, declarations, transformer);
            filter_processing(bucket, declarations);
        }
    }
    buckets
}

/// Rewrite entry display fields from the local declaration's authoritative
/// data, unless the local copy is a failed download (then the server's
/// snapshot fields are the best available view)
fn overwrite_display_fields(
    bucket: &mut WorkqueueBucket,
    declarations: &[Declaration],
    transformer: &impl FormTransformer,
) {
    for entry in &mut bucket.results {
        let Some(local) = declarations.iter().find(|d| d.id == entry.id) else {
            continue;
        };
        if local.download_failed() {
            continue;
        }
        let fields = transformer.display_fields(local.event, &local.data);
        entry.name = fields.name;
        entry.date_of_event = fields.date_of_event;
        entry.contact_number = fields.contact_number;
    }
}

/// Drop entries this client is actively submitting and shrink the bucket
/// total accordingly, so in-flight records are not double-counted
pub fn filter_processing(bucket: &mut WorkqueueBucket, declarations: &[Declaration]) {
    let before = bucket.results.len();
    bucket.results.retain(|entry| {
        !declarations
            .iter()
            .any(|d| d.id == entry.id && d.submission_status.is_in_flight())
    });
    let removed = (before - bucket.results.len()) as u32;
    if removed > 0 {
        bucket.total_items = bucket.total_items.saturating_sub(removed);
        debug!(removed, "filtered in-flight declarations from bucket");
    }
}
