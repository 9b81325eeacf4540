//! Download queue controller
//!
//! Fetches full server payloads for declarations that exist locally only as
//! stubs, one transfer at a time. At most one declaration holds
//! `Downloading` across the store; everything else waits at
//! `ReadyToDownload` and is promoted in list order once the current transfer
//! resolves. Retries are immediate and capped — downloads are user-initiated
//! and blocking, so fast bounded retry beats backoff here.
//!
//! Transitions are pure; the engine runner executes the returned effects in
//! order, which sequences persistence before the next fetch.

use crate::error::RemoteError;
use crate::lifecycle::Effect;
use crate::transform::TransformedCase;
use crate::types::{Action, Declaration, DownloadStatus, UserRecord};
use tracing::{debug, warn};

fn fetch_effect(decl: &Declaration) -> Effect {
    Effect::Fetch {
        id: decl.id.clone(),
        event: decl.event,
        action: decl.action.unwrap_or(Action::LoadReview),
    }
}

/// Promote the first queued entry, if any, and return its fetch effect
fn promote_next(record: &mut UserRecord) -> Option<Effect> {
    let next = record
        .declarations
        .iter_mut()
        .find(|d| d.download_status == Some(DownloadStatus::ReadyToDownload))?;
    next.download_status = Some(DownloadStatus::Downloading);
    next.download_retry_attempt = 0;
    debug!(id = %next.id, "promoting queued declaration to downloading");
    Some(fetch_effect(next))
}

/// Enqueue a declaration for download
///
/// If no transfer is in flight the target goes straight to `Downloading` and
/// its fetch effect is returned; otherwise it is parked at `ReadyToDownload`.
/// An existing entry (e.g. a previous terminal failure) is overwritten.
pub fn enqueue(record: &mut UserRecord, mut stub: Declaration) -> Vec<Effect> {
    if let Some(current) = record.downloading() {
        if current.id == stub.id {
            debug!(id = %stub.id, "already downloading, ignoring enqueue");
            return Vec::new();
        }
        stub.download_status = Some(DownloadStatus::ReadyToDownload);
        stub.download_retry_attempt = 0;
        debug!(id = %stub.id, "transfer in flight, parking declaration");
        record.upsert(stub);
        return Vec::new();
    }

    stub.download_status = Some(DownloadStatus::Downloading);
    stub.download_retry_attempt = 0;
    let effect = fetch_effect(&stub);
    record.upsert(stub);
    vec![effect]
}

/// Resolve a successful fetch
///
/// Replaces the downloading declaration with a hydrated review declaration,
/// persists, then promotes the next queued entry — the fetch effect is
/// ordered after `Persist` so storage and network stay one-in-flight each.
pub fn on_fetch_success(record: &mut UserRecord, id: &str, case: TransformedCase) -> Vec<Effect> {
    let Some(existing) = record.find_mut(id) else {
        warn!(%id, "fetch resolved for a declaration no longer in the store");
        return Vec::new();
    };

    let mut review = Declaration::review(
        existing.id.clone(),
        existing.event,
        case.data,
        case.registration_status,
        case.duplicates,
    );
    review.action = existing.action;
    *existing = review;

    let mut effects = vec![Effect::Persist];
    effects.extend(promote_next(record));
    effects
}

/// Resolve a failed fetch
///
/// Below the attempt budget the same fetch is re-issued immediately. Once
/// the budget is exhausted the failure is classified — transport errors end
/// in `FailedNetwork`, everything else in `Failed` — the list is persisted,
/// and either the next queued entry is promoted or the failure is surfaced.
pub fn on_fetch_failure(
    record: &mut UserRecord,
    id: &str,
    error: &RemoteError,
    max_attempts: u32,
) -> Vec<Effect> {
    let Some(decl) = record.find_mut(id) else {
        warn!(%id, "fetch failed for a declaration no longer in the store");
        return Vec::new();
    };

    decl.download_retry_attempt += 1;
    if decl.download_retry_attempt < max_attempts {
        debug!(
            %id,
            attempt = decl.download_retry_attempt,
            "fetch failed, retrying immediately"
        );
        return vec![fetch_effect(decl)];
    }

    let status = if error.is_network() {
        DownloadStatus::FailedNetwork
    } else {
        DownloadStatus::Failed
    };
    decl.download_status = Some(status);
    warn!(%id, ?status, %error, "download attempts exhausted");

    let mut effects = vec![Effect::Persist];
    match promote_next(record) {
        Some(fetch) => effects.push(fetch),
        None => effects.push(Effect::NotifyDownloadFailed {
            id: id.to_string(),
            status,
        }),
    }
    effects
}
