//! Engine lifecycle and persistence integration tests
//!
//! Covers the command surface end to end against in-memory storage:
//! - store/modify/delete round trips and their signals
//! - merge-on-read hydration across sessions
//! - workqueue refresh, reconciliation and degraded mode

mod common;

use async_trait::async_trait;
use caseflow_sdk::store::{DurableStore, InMemoryStore, UserRecordStore};
use caseflow_sdk::transform::PassthroughTransformer;
use caseflow_sdk::{
    Action, BucketMap, CaseSummary, Declaration, DeclarationData, EngineConfig, EngineEvent, Event,
    FieldValue, PageParams, Role, StoreError, SubmissionStatus, SyncEngine, WorkqueueBucket,
    WorkqueueKind, WorkqueueQuery,
};
use common::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

fn child_data(first_name: &str) -> DeclarationData {
    let mut data = DeclarationData::new();
    let child = data.entry("child".into()).or_default();
    child.insert("first_name".into(), FieldValue::from(first_name));
    child.insert("family_name".into(), FieldValue::from("Bell"));
    child.insert("birth_date".into(), FieldValue::from("2026-03-01"));
    data
}

// =============================================================================
// Lifecycle commands
// =============================================================================

#[tokio::test]
async fn store_persists_and_signals_saved() {
    let store = InMemoryStore::new();
    let (mut engine, mut events) = engine_with(store.clone(), ScriptedRemote::new());

    let mut draft = Declaration::new_draft(Event::Birth);
    draft.id = "d1".into();
    engine.store_declaration(draft).await;

    assert_eq!(drain_events(&mut events), vec![EngineEvent::Saved]);
    assert!(engine.find_declaration("d1").unwrap().saved_on.is_some());

    // Visible through a fresh store reader as well
    let records = UserRecordStore::new(store);
    assert!(records.find_declaration("u1", "d1").await.unwrap().is_some());
}

#[tokio::test]
async fn modify_round_trips_nested_data() {
    let store = InMemoryStore::new();
    let (mut engine, _events) = engine_with(store.clone(), ScriptedRemote::new());

    let mut draft = Declaration::new_draft(Event::Birth);
    draft.id = "d1".into();
    engine.store_declaration(draft).await;
    engine.modify_declaration("d1", child_data("Ada")).await;

    let records = UserRecordStore::new(store);
    let persisted = records
        .find_declaration("u1", "d1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(persisted.data, child_data("Ada"));
    assert_eq!(persisted, engine.find_declaration("d1").unwrap().clone());
}

#[tokio::test]
async fn delete_emits_refresh_unless_suppressed() {
    let (mut engine, mut events) = engine_with(Default::default(), ScriptedRemote::new());

    let mut a = Declaration::new_draft(Event::Birth);
    a.id = "a".into();
    let mut b = Declaration::new_draft(Event::Birth);
    b.id = "b".into();
    engine.store_declaration(a).await;
    engine.store_declaration(b).await;
    drain_events(&mut events);

    engine.delete_declaration("a", false).await;
    assert_eq!(
        drain_events(&mut events),
        vec![EngineEvent::Saved, EngineEvent::Refresh]
    );

    engine.delete_declaration("b", true).await;
    assert_eq!(drain_events(&mut events), vec![EngineEvent::Saved]);
    assert!(engine.user_record().declarations.is_empty());
}

#[tokio::test]
async fn archive_then_reinstate_staging() {
    let (mut engine, _events) = engine_with(Default::default(), ScriptedRemote::new());

    let mut draft = Declaration::new_draft(Event::Death);
    draft.id = "d1".into();
    engine.store_declaration(draft).await;

    engine.archive_declaration("d1").await;
    {
        let decl = engine.find_declaration("d1").unwrap();
        assert_eq!(decl.submission_status, SubmissionStatus::ReadyToArchive);
        assert_eq!(decl.action, Some(Action::Archive));
    }

    engine.reinstate_declaration("d1").await;
    let decl = engine.find_declaration("d1").unwrap();
    assert_eq!(decl.submission_status, SubmissionStatus::ReadyToReinstate);
    assert_eq!(decl.action, Some(Action::Reinstate));
}

#[tokio::test]
async fn write_callback_fires_before_saved_signal() {
    let (mut engine, mut events) = engine_with(Default::default(), ScriptedRemote::new());

    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    engine
        .write(Some(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
        })))
        .await;

    // The callback ran and the signal arrived afterwards
    assert!(fired.load(Ordering::SeqCst));
    assert_eq!(drain_events(&mut events), vec![EngineEvent::Saved]);
}

// =============================================================================
// Persistence failure surface
// =============================================================================

/// Store whose writes always fail; reads succeed
#[derive(Clone, Default)]
struct ReadOnlyStore {
    inner: InMemoryStore,
}

#[async_trait]
impl DurableStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk full".into()))
    }
}

#[tokio::test]
async fn failed_write_signals_but_keeps_in_memory_state() {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut engine = SyncEngine::new(
        "u1",
        ReadOnlyStore::default(),
        ScriptedRemote::new(),
        PassthroughTransformer,
        EngineConfig::default(),
        events_tx,
    );

    let mut draft = Declaration::new_draft(Event::Birth);
    draft.id = "d1".into();
    engine.store_declaration(draft).await;

    let events = drain_events(&mut events);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::SaveFailed { .. }]
    ));
    // No rollback: the declaration stays in the working copy
    assert!(engine.find_declaration("d1").is_some());
}

// =============================================================================
// Hydration / merge-on-read
// =============================================================================

#[tokio::test]
async fn hydrate_prefers_stored_copies_except_in_flight_ones() {
    let store = InMemoryStore::new();

    // Session one persists two declarations
    {
        let (mut engine, _events) = engine_with(store.clone(), ScriptedRemote::new());
        let mut a = Declaration::new_draft(Event::Birth);
        a.id = "a".into();
        let mut b = Declaration::new_draft(Event::Birth);
        b.id = "b".into();
        engine.store_declaration(a).await;
        engine.store_declaration(b).await;
        engine.modify_declaration("a", child_data("Stored")).await;
    }

    // Session two: every write fails, so its working copy never reaches
    // storage — an in-flight copy of "a" and a brand-new "c"
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut engine = SyncEngine::new(
        "u1",
        ReadOnlyStore { inner: store },
        ScriptedRemote::new(),
        PassthroughTransformer,
        EngineConfig::default(),
        events_tx,
    );

    let mut in_flight = Declaration::new_draft(Event::Birth);
    in_flight.id = "a".into();
    in_flight.submission_status = SubmissionStatus::Submitting;
    in_flight.data = child_data("InFlight");
    let mut fresh = Declaration::new_draft(Event::Birth);
    fresh.id = "c".into();

    engine.store_declaration(in_flight).await;
    engine.store_declaration(fresh).await;
    assert!(drain_events(&mut events)
        .iter()
        .all(|e| matches!(e, EngineEvent::SaveFailed { .. })));

    engine.hydrate().await.unwrap();

    // The in-flight copy of "a" survived hydration
    let a = engine.find_declaration("a").unwrap();
    assert_eq!(a.submission_status, SubmissionStatus::Submitting);
    assert_eq!(a.data, child_data("InFlight"));

    // "b" came back from storage, "c" was kept as never-persisted
    assert!(engine.find_declaration("b").is_some());
    assert_eq!(
        engine.find_declaration("b").unwrap().submission_status,
        SubmissionStatus::Draft
    );
    assert!(engine.find_declaration("c").is_some());
}

#[tokio::test]
async fn hydrate_unknown_user_yields_empty_record() {
    let (mut engine, _events) = engine_with(Default::default(), ScriptedRemote::new());
    engine.hydrate().await.unwrap();
    assert!(engine.user_record().declarations.is_empty());
    assert!(engine.workqueue().is_none());
}

// =============================================================================
// Workqueue refresh
// =============================================================================

fn review_bucket(total: u32, ids: &[&str]) -> BucketMap {
    let mut buckets = BucketMap::new();
    buckets.insert(
        WorkqueueKind::Review,
        WorkqueueBucket {
            total_items: total,
            results: ids
                .iter()
                .map(|id| CaseSummary {
                    id: id.to_string(),
                    event: Event::Birth,
                    registration_status: Some("DECLARED".into()),
                    name: Some("Server Name".into()),
                    date_of_event: Some("2026-01-01".into()),
                    contact_number: None,
                })
                .collect(),
        },
    );
    buckets
}

#[tokio::test]
async fn refresh_reconciles_and_persists_snapshot() {
    let remote = ScriptedRemote::new();
    remote.push_search_ok(review_bucket(5, &["x", "y"]));
    let store = InMemoryStore::new();
    let (mut engine, _events) = engine_with(store.clone(), remote);

    // "x" is being submitted by this client: it must drop out of the bucket
    let mut submitting = Declaration::new_draft(Event::Birth);
    submitting.id = "x".into();
    engine.store_declaration(submitting).await;
    // Stage it into an in-flight state through the public surface
    engine.archive_declaration("x").await;

    let query = WorkqueueQuery::new("u1", Role::Registrar)
        .with_page(WorkqueueKind::Review, PageParams::default());
    engine.refresh_workqueue(&query).await.unwrap();

    let wq = engine.workqueue().unwrap();
    assert!(wq.initial_synced);
    assert!(!wq.error);
    let bucket = wq.bucket(WorkqueueKind::Review).unwrap();
    assert_eq!(bucket.total_items, 4);
    assert_eq!(bucket.results.len(), 1);
    assert_eq!(bucket.results[0].id, "y");

    // The corrected snapshot reached durable storage
    let records = UserRecordStore::new(store);
    let persisted = records.load("u1").await.unwrap();
    assert_eq!(persisted.workqueue.as_ref(), engine.workqueue());
}

#[tokio::test]
async fn refresh_failure_retains_previous_snapshot_with_error_flag() {
    let remote = ScriptedRemote::new();
    remote.push_search_ok(review_bucket(2, &["x"]));
    remote.push_search_err(unreachable());
    let (mut engine, _events) = engine_with(Default::default(), remote);

    let query = WorkqueueQuery::new("u1", Role::FieldAgent);
    engine.refresh_workqueue(&query).await.unwrap();
    assert!(!engine.workqueue().unwrap().error);

    let err = engine.refresh_workqueue(&query).await.unwrap_err();
    assert!(err.to_string().contains("network unreachable"));

    let wq = engine.workqueue().unwrap();
    assert!(wq.error);
    assert!(wq.initial_synced);
    // Previous page is still there for display
    assert_eq!(wq.bucket(WorkqueueKind::Review).unwrap().total_items, 2);
}

#[tokio::test]
async fn refresh_failure_without_prior_snapshot_sets_empty_errored_queue() {
    let remote = ScriptedRemote::new();
    remote.push_search_err(rejected());
    let (mut engine, _events) = engine_with(Default::default(), remote);

    let query = WorkqueueQuery::new("u1", Role::FieldAgent);
    assert!(engine.refresh_workqueue(&query).await.is_err());

    let wq = engine.workqueue().unwrap();
    assert!(wq.error);
    assert!(!wq.initial_synced);
}
