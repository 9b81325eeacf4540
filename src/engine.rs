//! Sync engine — owns the per-user working copy and runs command side effects
//!
//! Commands apply a pure transition first, then the runner drains the
//! returned effect list strictly in order, awaiting each persistence or
//! network call before starting the next. Fetch results feed back through the
//! download queue transitions inside the same drain, so a chain of retries
//! and promotions still executes one call at a time.
//!
//! Downloads split into two halves the way the write buffer does on the
//! content client: `enqueue_download` records the transfer and updates queue
//! state immediately, `flush_downloads` pumps transfers one at a time until
//! the queue is idle. Commands therefore stay serialized while further
//! enqueues can land between a transfer's start and its resolution.
//!
//! The in-memory record is the source of truth: a failed persistence write
//! emits `SaveFailed` but never rolls the mutation back.

use crate::error::{RemoteError, Result};
use crate::lifecycle::{self, Command, Effect};
use crate::queue;
use crate::remote::RemoteCaseService;
use crate::store::{DurableStore, UserRecordStore};
use crate::transform::FormTransformer;
use crate::types::{
    Declaration, DeclarationData, DownloadStatus, UserDetails, UserRecord, Workqueue,
    WorkqueueQuery,
};
use crate::workqueue;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fetch attempts per declaration before a terminal download failure
    pub max_download_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_download_attempts: 3,
        }
    }
}

/// Signal emitted by the engine while executing command side effects
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The user record reached durable storage
    Saved,
    /// Persistence rejected the write; in-memory state is unchanged and a
    /// later command or restart is expected to retry
    SaveFailed { reason: String },
    /// The UI should refresh its declaration lists
    Refresh,
    /// A download exhausted its attempt budget
    DownloadFailed { id: String, status: DownloadStatus },
}

/// Callback fired after a successful write, before the `Saved` signal
pub type SavedCallback = Box<dyn FnOnce() + Send>;

/// Client-resident sync engine for one authenticated user
///
/// # Example
///
/// ```rust,ignore
/// use caseflow_sdk::{Declaration, EngineConfig, Event, SyncEngine};
/// use caseflow_sdk::remote::{GatewayCaseService, GatewayConfig};
/// use caseflow_sdk::store::FileStore;
/// use caseflow_sdk::transform::PassthroughTransformer;
///
/// let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
/// let mut engine = SyncEngine::new(
///     "user-1",
///     FileStore::new("/data/caseflow"),
///     GatewayCaseService::new(GatewayConfig::default()),
///     PassthroughTransformer,
///     EngineConfig::default(),
///     events_tx,
/// );
///
/// engine.hydrate().await?;
/// engine.store_declaration(Declaration::new_draft(Event::Birth)).await;
/// ```
pub struct SyncEngine<S, R, F> {
    user: UserRecord,
    records: UserRecordStore<S>,
    remote: R,
    transformer: F,
    config: EngineConfig,
    events: mpsc::UnboundedSender<EngineEvent>,
    /// Transfers recorded by `enqueue_download`, pumped by `flush_downloads`
    pending_downloads: VecDeque<Effect>,
}

impl<S, R, F> SyncEngine<S, R, F>
where
    S: DurableStore,
    R: RemoteCaseService,
    F: FormTransformer,
{
    pub fn new(
        user_id: impl Into<String>,
        store: S,
        remote: R,
        transformer: F,
        config: EngineConfig,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            user: UserRecord::new(user_id),
            records: UserRecordStore::new(store),
            remote,
            transformer,
            config,
            events,
            pending_downloads: VecDeque::new(),
        }
    }

    /// The in-memory working copy
    pub fn user_record(&self) -> &UserRecord {
        &self.user
    }

    pub fn find_declaration(&self, id: &str) -> Option<&Declaration> {
        self.user.find(id)
    }

    pub fn workqueue(&self) -> Option<&Workqueue> {
        self.user.workqueue.as_ref()
    }

    /// Currently authenticated user identity from durable storage
    pub async fn user_details(&self) -> Result<Option<UserDetails>> {
        self.records.load_user_details().await
    }

    /// Load the persisted record and merge it with the working copy
    ///
    /// The stored copy wins except for declarations the working copy holds in
    /// an in-flight submission state, or that storage has never seen — those
    /// are newer than anything persisted. A transfer that was interrupted by
    /// a restart is re-recorded so the next `flush_downloads` resumes it.
    pub async fn hydrate(&mut self) -> Result<()> {
        let mut merged = self.records.load(&self.user.user_id).await?;
        for local in std::mem::take(&mut self.user.declarations) {
            if local.submission_status.is_in_flight() || merged.find(&local.id).is_none() {
                merged.upsert(local);
            }
        }
        if merged.workqueue.is_none() {
            merged.workqueue = self.user.workqueue.take();
        }
        debug!(
            user_id = %merged.user_id,
            declarations = merged.declarations.len(),
            "hydrated user record"
        );
        self.user = merged;

        if self.pending_downloads.is_empty() {
            if let Some(interrupted) = self.user.downloading() {
                debug!(id = %interrupted.id, "resuming interrupted download");
                self.pending_downloads.push_back(Effect::Fetch {
                    id: interrupted.id.clone(),
                    event: interrupted.event,
                    action: interrupted.action.unwrap_or(crate::types::Action::LoadReview),
                });
            }
        }
        Ok(())
    }

    // === Lifecycle commands ===

    /// Insert a brand-new declaration; calling twice for the same id is a
    /// caller error and leaves the store unchanged
    pub async fn store_declaration(&mut self, declaration: Declaration) {
        let effects = lifecycle::apply(
            &mut self.user,
            Command::Store { declaration },
            crate::now_ms(),
        );
        self.run_effects(effects).await;
    }

    /// Replace a declaration's form data wholesale
    pub async fn modify_declaration(&mut self, id: &str, data: DeclarationData) {
        let effects = lifecycle::apply(
            &mut self.user,
            Command::Modify {
                id: id.to_string(),
                data,
            },
            crate::now_ms(),
        );
        self.run_effects(effects).await;
    }

    /// Remove a declaration. Fire-and-forget: the record is gone from the
    /// working copy immediately and from durable reads once the chained
    /// write lands.
    pub async fn delete_declaration(&mut self, id: &str, suppress_refresh: bool) {
        let effects = lifecycle::apply(
            &mut self.user,
            Command::Delete {
                id: id.to_string(),
                suppress_refresh,
            },
            crate::now_ms(),
        );
        self.run_effects(effects).await;
    }

    pub async fn archive_declaration(&mut self, id: &str) {
        let effects = lifecycle::apply(
            &mut self.user,
            Command::Archive { id: id.to_string() },
            crate::now_ms(),
        );
        self.run_effects(effects).await;
    }

    pub async fn reinstate_declaration(&mut self, id: &str) {
        let effects = lifecycle::apply(
            &mut self.user,
            Command::Reinstate { id: id.to_string() },
            crate::now_ms(),
        );
        self.run_effects(effects).await;
    }

    /// Discard an in-progress correction overlay, restoring the downloaded
    /// snapshot
    pub async fn clear_correction_change(&mut self, id: &str) {
        let effects = lifecycle::apply(
            &mut self.user,
            Command::ClearCorrectionChange { id: id.to_string() },
            crate::now_ms(),
        );
        self.run_effects(effects).await;
    }

    /// Persist the working copy explicitly. `on_saved` fires after a
    /// successful write, before the `Saved` signal propagates.
    pub async fn write(&mut self, on_saved: Option<SavedCallback>) {
        self.persist(on_saved).await;
    }

    // === Download queue ===

    /// Enqueue a declaration for download
    ///
    /// Queue state updates immediately: with no transfer in flight the stub
    /// becomes `Downloading` and its fetch is recorded; otherwise it parks at
    /// `ReadyToDownload` until the current transfer resolves. Call
    /// `flush_downloads` to pump the recorded transfers.
    pub fn enqueue_download(&mut self, stub: Declaration) {
        let effects = queue::enqueue(&mut self.user, stub);
        self.pending_downloads.extend(effects);
    }

    /// Whether any transfer is recorded but not yet pumped to resolution
    pub fn has_pending_downloads(&self) -> bool {
        !self.pending_downloads.is_empty()
    }

    /// Pump recorded transfers until the download queue is idle
    ///
    /// Exactly one fetch is in flight at a time; each resolution persists
    /// before the next queued declaration is promoted and fetched.
    pub async fn flush_downloads(&mut self) {
        while let Some(effect) = self.pending_downloads.pop_front() {
            self.run_effects(vec![effect]).await;
        }
    }

    // === Workqueue ===

    /// Fetch and reconcile the role-scoped workqueue snapshot
    ///
    /// On success the previous snapshot is replaced wholesale and persisted.
    /// On failure the previous snapshot is retained with its `error` flag
    /// set, and the error is returned for surfacing.
    pub async fn refresh_workqueue(&mut self, query: &WorkqueueQuery) -> Result<()> {
        match self.remote.search_workqueues(query).await {
            Ok(buckets) => {
                let reconciled = workqueue::reconcile(
                    buckets,
                    &self.user.declarations,
                    query.role,
                    &self.transformer,
                );
                self.user
                    .workqueue
                    .get_or_insert_with(Workqueue::default)
                    .replace(reconciled);
                self.persist(None).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "workqueue fetch failed, retaining previous snapshot");
                self.user
                    .workqueue
                    .get_or_insert_with(Workqueue::default)
                    .mark_failed();
                Err(e.into())
            }
        }
    }

    // === Effect runner ===

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::Persist => self.persist(None).await,

                Effect::EmitRefresh => {
                    let _ = self.events.send(EngineEvent::Refresh);
                }

                Effect::NotifyDownloadFailed { id, status } => {
                    let _ = self.events.send(EngineEvent::DownloadFailed { id, status });
                }

                Effect::Fetch { id, event, action } => {
                    let next = match self.remote.fetch_declaration(event, action, &id).await {
                        Ok(payload) => match self.transformer.to_local(event, &payload) {
                            Ok(case) => queue::on_fetch_success(&mut self.user, &id, case),
                            Err(e) => {
                                let err = RemoteError::InvalidResponse(e.to_string());
                                queue::on_fetch_failure(
                                    &mut self.user,
                                    &id,
                                    &err,
                                    self.config.max_download_attempts,
                                )
                            }
                        },
                        Err(e) => queue::on_fetch_failure(
                            &mut self.user,
                            &id,
                            &e,
                            self.config.max_download_attempts,
                        ),
                    };
                    pending.extend(next);
                }
            }
        }
    }

    async fn persist(&mut self, on_saved: Option<SavedCallback>) {
        match self.records.save(&self.user).await {
            Ok(()) => {
                if let Some(callback) = on_saved {
                    callback();
                }
                let _ = self.events.send(EngineEvent::Saved);
            }
            Err(e) => {
                error!(error = %e, user_id = %self.user.user_id, "failed to persist user record");
                let _ = self.events.send(EngineEvent::SaveFailed {
                    reason: e.to_string(),
                });
            }
        }
    }
}
