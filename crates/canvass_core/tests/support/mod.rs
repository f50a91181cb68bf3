#![allow(dead_code)]

use async_trait::async_trait;
use canvass_core::db::open_db_in_memory;
use canvass_core::{
    Entry, EntryId, EntryPatch, RecordStore, SqliteRecordStore, StoreError, StoreResult, Tracker,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// SQLite store that counts writes and can be told to fail them.
pub struct ProbeStore {
    inner: SqliteRecordStore,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl ProbeStore {
    pub fn new() -> Arc<Self> {
        let conn = open_db_in_memory().unwrap();
        Arc::new(Self {
            inner: SqliteRecordStore::try_new(conn).unwrap(),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn begin_write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("permission denied".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for ProbeStore {
    async fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        self.inner.list_entries().await
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Option<Entry>> {
        self.inner.get_entry(id).await
    }

    async fn upsert_entry(&self, id: Option<&EntryId>, entry: &Entry) -> StoreResult<EntryId> {
        self.begin_write()?;
        self.inner.upsert_entry(id, entry).await
    }

    async fn merge_entry(&self, id: &EntryId, patch: &EntryPatch) -> StoreResult<()> {
        self.begin_write()?;
        self.inner.merge_entry(id, patch).await
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        self.begin_write()?;
        self.inner.delete_entry(id).await
    }
}

pub fn tracker_with_probe() -> (Tracker, Arc<ProbeStore>) {
    let store = ProbeStore::new();
    let tracker = Tracker::new(store.clone());
    (tracker, store)
}

pub fn sqlite_store() -> SqliteRecordStore {
    SqliteRecordStore::try_new(open_db_in_memory().unwrap()).unwrap()
}
