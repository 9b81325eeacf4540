//! Durable persistence
//!
//! The storage primitive is an injected string-keyed `get`/`set` adapter;
//! `UserRecordStore` layers the per-user record model on top of it.

mod durable;
mod user_records;

pub use durable::{DurableStore, FileStore, InMemoryStore};
pub use user_records::{UserRecordStore, USER_DATA_KEY, USER_DETAILS_KEY};
