//! Declaration lifecycle state machine
//!
//! Pure command application: `apply` mutates the in-memory `UserRecord` and
//! returns an ordered list of effects for the engine runner to execute, one
//! at a time. Keeping the transitions synchronous makes every lifecycle rule
//! testable without a runtime.
//!
//! Unknown-id commands are no-ops returning no effects; on this offline,
//! best-effort client a stale caller is expected, not exceptional.

use crate::types::{
    Action, Declaration, DeclarationData, DownloadStatus, Event, SubmissionStatus, UserRecord,
};
use tracing::{debug, warn};

/// Registration section carrying the denormalized informant fields.
///
/// The relationship field is a denormalized copy of the canonical informant
/// type; `Modify` re-derives it so the two can never diverge. This is a
/// documented one-off for the current form shape, not a general rule.
const REGISTRATION_SECTION: &str = "registration";
const INFORMANT_TYPE_FIELD: &str = "informant_type";
const INFORMANT_RELATION_FIELD: &str = "informant_relation";

/// User-initiated lifecycle command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a brand-new declaration; duplicate ids are a caller error and
    /// leave the store unchanged
    Store { declaration: Declaration },
    /// Replace a declaration's form data wholesale
    Modify { id: String, data: DeclarationData },
    /// Remove a declaration; fire-and-forget from the caller's perspective
    Delete { id: String, suppress_refresh: bool },
    Archive { id: String },
    Reinstate { id: String },
    /// Discard an in-progress correction overlay
    ClearCorrectionChange { id: String },
}

/// Side effect requested by a transition, executed strictly in order by the
/// engine runner — at most one persistence call and one network call are in
/// flight at any time
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the user's full declaration list under their record
    Persist,
    /// Fetch the server payload for one declaration
    Fetch {
        id: String,
        event: Event,
        action: Action,
    },
    /// Ask the UI layer to refresh its lists
    EmitRefresh,
    /// Surface a terminal download failure to the user
    NotifyDownloadFailed { id: String, status: DownloadStatus },
}

/// Apply one command against the in-memory record
pub fn apply(record: &mut UserRecord, command: Command, now_ms: u64) -> Vec<Effect> {
    match command {
        Command::Store { mut declaration } => {
            if record.find(&declaration.id).is_some() {
                warn!(id = %declaration.id, "store called twice for the same id, ignoring");
                return Vec::new();
            }
            declaration.saved_on = Some(now_ms);
            declaration.modified_on = Some(now_ms);
            debug!(id = %declaration.id, "storing new declaration");
            record.declarations.push(declaration);
            vec![Effect::Persist]
        }

        Command::Modify { id, mut data } => {
            reconcile_informant_relation(&mut data);
            let Some(decl) = record.find_mut(&id) else {
                warn!(%id, "modify on unknown declaration, ignoring");
                return Vec::new();
            };
            decl.data = data;
            decl.modified_on = Some(now_ms);
            vec![Effect::Persist]
        }

        Command::Delete {
            id,
            suppress_refresh,
        } => {
            if !record.remove(&id) {
                warn!(%id, "delete on unknown declaration, ignoring");
                return Vec::new();
            }
            let mut effects = vec![Effect::Persist];
            if !suppress_refresh {
                effects.push(Effect::EmitRefresh);
            }
            effects
        }

        Command::Archive { id } => {
            stage_for_action(record, &id, SubmissionStatus::ReadyToArchive, Action::Archive, now_ms)
        }

        Command::Reinstate { id } => stage_for_action(
            record,
            &id,
            SubmissionStatus::ReadyToReinstate,
            Action::Reinstate,
            now_ms,
        ),

        Command::ClearCorrectionChange { id } => {
            let Some(decl) = record.find_mut(&id) else {
                warn!(%id, "clear correction on unknown declaration, ignoring");
                return Vec::new();
            };
            let Some(original) = decl.original_data.clone() else {
                debug!(%id, "no correction overlay to clear");
                return Vec::new();
            };
            decl.data = original;
            decl.modified_on = Some(now_ms);
            vec![Effect::Persist]
        }
    }
}

/// Tag a declaration as ready for a server action and chain a write
fn stage_for_action(
    record: &mut UserRecord,
    id: &str,
    status: SubmissionStatus,
    action: Action,
    now_ms: u64,
) -> Vec<Effect> {
    let Some(decl) = record.find_mut(id) else {
        warn!(%id, ?action, "staging on unknown declaration, ignoring");
        return Vec::new();
    };
    decl.submission_status = status;
    decl.action = Some(action);
    decl.modified_on = Some(now_ms);
    debug!(%id, ?action, "staged declaration for server action");
    vec![Effect::Persist]
}

/// Re-derive the denormalized informant relationship from the canonical
/// informant type when the registration section carries both fields
fn reconcile_informant_relation(data: &mut DeclarationData) {
    let Some(registration) = data.get_mut(REGISTRATION_SECTION) else {
        return;
    };
    if !registration.contains_key(INFORMANT_RELATION_FIELD) {
        return;
    }
    if let Some(canonical) = registration.get(INFORMANT_TYPE_FIELD).cloned() {
        registration.insert(INFORMANT_RELATION_FIELD.to_string(), canonical);
    }
}
