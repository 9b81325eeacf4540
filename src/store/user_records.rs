//! Per-user record store over the durable adapter
//!
//! Persists every user's partition as one JSON array under `USER_DATA`,
//! replace-or-append per user. All writes for a given user flow through here
//! in issuance order, which is what makes them totally ordered.

use super::durable::DurableStore;
use crate::error::Result;
use crate::types::{Declaration, UserDetails, UserRecord};
use tracing::debug;

/// Storage key holding the JSON-encoded array of `UserRecord`
pub const USER_DATA_KEY: &str = "USER_DATA";
/// Storage key holding the authenticated user's identity (read-only here)
pub const USER_DETAILS_KEY: &str = "USER_DETAILS";

/// Narrow persistence surface for per-user declaration state
pub struct UserRecordStore<S> {
    store: S,
}

impl<S: DurableStore> UserRecordStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>> {
        match self.store.get(USER_DATA_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Load one user's record; a user never seen before gets an empty one
    pub async fn load(&self, user_id: &str) -> Result<UserRecord> {
        let records = self.read_all().await?;
        Ok(records
            .into_iter()
            .find(|r| r.user_id == user_id)
            .unwrap_or_else(|| UserRecord::new(user_id)))
    }

    /// Persist one user's record, leaving other users' partitions untouched
    pub async fn save(&self, record: &UserRecord) -> Result<()> {
        let mut records = self.read_all().await?;
        match records.iter_mut().find(|r| r.user_id == record.user_id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        let raw = serde_json::to_string(&records)?;
        self.store.set(USER_DATA_KEY, &raw).await?;
        debug!(
            user_id = %record.user_id,
            declarations = record.declarations.len(),
            "persisted user record"
        );
        Ok(())
    }

    /// Look up one declaration without materializing the whole record
    pub async fn find_declaration(&self, user_id: &str, id: &str) -> Result<Option<Declaration>> {
        let record = self.load(user_id).await?;
        Ok(record.find(id).cloned())
    }

    /// Currently authenticated user, if any
    pub async fn load_user_details(&self) -> Result<Option<UserDetails>> {
        match self.store.get(USER_DETAILS_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{Action, Declaration, Event, FieldValue, Role};

    fn record_with_decl(user_id: &str, decl_id: &str) -> UserRecord {
        let mut record = UserRecord::new(user_id);
        let mut decl = Declaration::stub(decl_id, Event::Birth, Action::LoadReview);
        decl.data
            .entry("child".into())
            .or_default()
            .insert("first_name".into(), FieldValue::from("Ada"));
        record.upsert(decl);
        record
    }

    #[tokio::test]
    async fn load_unknown_user_returns_empty_record() {
        let records = UserRecordStore::new(InMemoryStore::new());
        let loaded = records.load("nobody").await.unwrap();
        assert_eq!(loaded.user_id, "nobody");
        assert!(loaded.declarations.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_is_deep_equal() {
        let records = UserRecordStore::new(InMemoryStore::new());
        let record = record_with_decl("u1", "d1");

        records.save(&record).await.unwrap();
        let loaded = records.load("u1").await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn save_does_not_clobber_other_users() {
        let records = UserRecordStore::new(InMemoryStore::new());
        records.save(&record_with_decl("u1", "d1")).await.unwrap();
        records.save(&record_with_decl("u2", "d2")).await.unwrap();

        // Re-save u1; u2's partition must survive
        records.save(&record_with_decl("u1", "d9")).await.unwrap();

        let u2 = records.load("u2").await.unwrap();
        assert!(u2.find("d2").is_some());
        let u1 = records.load("u1").await.unwrap();
        assert!(u1.find("d9").is_some());
    }

    #[tokio::test]
    async fn find_declaration_by_user_and_id() {
        let records = UserRecordStore::new(InMemoryStore::new());
        records.save(&record_with_decl("u1", "d1")).await.unwrap();

        assert!(records.find_declaration("u1", "d1").await.unwrap().is_some());
        assert!(records.find_declaration("u1", "dx").await.unwrap().is_none());
        assert!(records.find_declaration("u2", "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_details_readback() {
        let store = InMemoryStore::new();
        let details = UserDetails {
            user_id: "u1".into(),
            role: Role::Registrar,
            location_id: Some("loc-9".into()),
        };
        store
            .set(USER_DETAILS_KEY, &serde_json::to_string(&details).unwrap())
            .await
            .unwrap();

        let records = UserRecordStore::new(store);
        assert_eq!(records.load_user_details().await.unwrap(), Some(details));
    }
}
