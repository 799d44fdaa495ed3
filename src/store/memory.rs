//! In-memory record store
//!
//! Same insert-only contract as the PostgreSQL store. Records do not survive
//! a restart.

use super::{PutOutcome, RecordStore, StoreResult};
use crate::models::AnimeRecord;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<DashMap<i32, AnimeRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, anime_id: i32) -> StoreResult<Option<AnimeRecord>> {
        Ok(self.inner.get(&anime_id).map(|r| r.value().clone()))
    }

    async fn put(&self, record: &AnimeRecord) -> StoreResult<PutOutcome> {
        match self.inner.entry(record.id) {
            Entry::Occupied(_) => Ok(PutOutcome::AlreadyPresent),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(PutOutcome::Inserted)
            }
        }
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
