//! Entry reconciliation engine.
//!
//! # Responsibility
//! - Decide whether a map interaction reopens an entry or starts a
//!   candidate.
//! - Write entries through the record store and fold the store's
//!   authoritative read-back into the in-memory collection.
//! - Own the in-memory collection every view reads from.
//!
//! # Invariants
//! - One entry per normalized address across persisted entries and
//!   candidates.
//! - The collection changes only after the store confirms a write.
//! - Store writes run on spawned tasks: dropping the caller's future never
//!   aborts a write halfway through the reconciliation step.
//! - With commit serialization on, writes for one key run one at a time in
//!   arrival order, and each write reaches the collection before the next
//!   one for that key starts.
//! - A pending candidate holds the latest unsaved edits; reopening its
//!   address returns them.

use crate::cancel::{CancellationToken, Completion};
use crate::collab::geocode::{resolve_address, Geocoder};
use crate::collab::map::{MapEvent, Marker};
use crate::model::address::normalize_address;
use crate::model::entry::{
    Coordinates, Entry, EntryDocument, EntryId, EntryPatch, EntryValidationError, Note,
};
use crate::repo::entry_store::{RecordStore, StoreError};
use crate::service::notes::{insert_note, remove_note};
use log::{debug, error, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;

/// Tracker operation failure. Never fatal; callers surface it as a notice.
#[derive(Debug)]
pub enum TrackerError {
    Store(StoreError),
    Validation(EntryValidationError),
    /// Operation needs a persisted entry.
    MissingId,
    /// Store response disagrees with what was written.
    InconsistentState(&'static str),
    /// Background write task panicked or was shut down.
    Task(String),
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::MissingId => write!(f, "entry has not been saved yet"),
            Self::InconsistentState(details) => write!(f, "inconsistent entry state: {details}"),
            Self::Task(message) => write!(f, "background write failed: {message}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TrackerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<EntryValidationError> for TrackerError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Default)]
struct TrackerState {
    /// Persisted entries in first-seen order.
    entries: Vec<Entry>,
    /// Unsaved candidates by normalized address.
    candidates: HashMap<String, Entry>,
    revision: u64,
}

impl TrackerState {
    fn find_by_key(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.address_key() == key)
    }

    fn install(&mut self, stored: Entry, submitted_key: &str) {
        self.candidates.remove(submitted_key);
        self.candidates.remove(&stored.address_key());
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.id == stored.id)
        {
            Some(slot) => *slot = stored,
            None => self.entries.push(stored),
        }
        self.revision += 1;
    }
}

struct TrackerInner {
    store: Arc<dyn RecordStore>,
    state: Mutex<TrackerState>,
    commit_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    serialize_commits: bool,
}

/// Shared handle to the reconciliation engine. Clones share one collection.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    /// Creates a tracker with per-key commit serialization enabled.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_commit_serialization(store, true)
    }

    pub fn with_commit_serialization(store: Arc<dyn RecordStore>, serialize_commits: bool) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                store,
                state: Mutex::new(TrackerState::default()),
                commit_locks: Mutex::new(HashMap::new()),
                serialize_commits,
            }),
        }
    }

    /// Replaces the collection with the store's current entries.
    ///
    /// Pending candidates whose address is now persisted are dropped.
    pub async fn load(&self) -> TrackerResult<usize> {
        let started_at = Instant::now();
        let entries = match self.inner.store.list_entries().await {
            Ok(entries) => entries,
            Err(err) => {
                error!(
                    "event=entries_load module=tracker status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(err.into());
            }
        };

        let count = entries.len();
        {
            let mut state = self.lock_state();
            for entry in &entries {
                state.candidates.remove(&entry.address_key());
            }
            state.entries = entries;
            state.revision += 1;
        }
        info!(
            "event=entries_load module=tracker status=ok count={count} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(count)
    }

    /// Reopens the entry for `address` or starts a candidate for it.
    ///
    /// Repeated calls for the same normalized address return the same record
    /// until it is saved or discarded. Existing coordinates always win.
    pub fn resolve_candidate(&self, location: Coordinates, address: &str) -> Entry {
        let key = normalize_address(address);
        let mut state = self.lock_state();
        if let Some(existing) = state.find_by_key(&key) {
            return existing.clone();
        }
        if let Some(candidate) = state.candidates.get(&key) {
            return candidate.clone();
        }

        let candidate = Entry::candidate(location, address);
        state.candidates.insert(key, candidate.clone());
        debug!(
            "event=candidate_open module=tracker status=ok pending={}",
            state.candidates.len()
        );
        candidate
    }

    /// Records unsaved edits on a pending candidate so reopening its address
    /// returns them.
    ///
    /// Returns `false` (and changes nothing) for persisted entries or when no
    /// candidate is pending for the address.
    pub fn update_candidate(&self, entry: &Entry) -> bool {
        if entry.is_persisted() {
            return false;
        }
        let key = entry.address_key();
        let mut state = self.lock_state();
        match state.candidates.get_mut(&key) {
            Some(pending) => {
                *pending = entry.clone();
                true
            }
            None => false,
        }
    }

    /// Fills defaults into a loosely-typed record without touching set fields.
    pub fn resolve_known(&self, document: EntryDocument) -> TrackerResult<Entry> {
        Ok(Entry::from_document(document)?)
    }

    /// Persisted entry by id, as reopened from its marker.
    pub fn open_entry(&self, id: &EntryId) -> Option<Entry> {
        self.lock_state()
            .entries
            .iter()
            .find(|entry| entry.id.as_ref() == Some(id))
            .cloned()
    }

    /// Routes a map interaction to the entry it opens.
    ///
    /// Clicks resolve an address through `geocoder` (with the coordinate
    /// fallback); marker clicks reopen the persisted entry, if it still
    /// exists.
    pub async fn handle_map_event(&self, event: MapEvent, geocoder: &dyn Geocoder) -> Option<Entry> {
        match event {
            MapEvent::Click(location) => {
                let address = resolve_address(geocoder, location).await;
                Some(self.resolve_candidate(location, &address))
            }
            MapEvent::MarkerClick(id) => self.open_entry(&id),
        }
    }

    /// Persists `entry` and returns the store's authoritative copy.
    ///
    /// Candidates receive their id here. On failure the collection is left
    /// as it was and the caller keeps its copy for a retry.
    pub async fn commit(&self, entry: &Entry) -> TrackerResult<Entry> {
        let tracker = self.clone();
        let entry = entry.clone();
        self.run_detached(async move { tracker.commit_now(entry).await })
            .await
    }

    /// `commit` on behalf of a view; the result is dropped if `scope` was
    /// cancelled before the write finished.
    pub async fn commit_in(
        &self,
        scope: &CancellationToken,
        entry: &Entry,
    ) -> Completion<TrackerResult<Entry>> {
        let result = self.commit(entry).await;
        if scope.is_cancelled() {
            debug!(
                "event=entry_commit module=tracker status=ignored ok={}",
                result.is_ok()
            );
            return Completion::Ignored;
        }
        Completion::Delivered(result)
    }

    /// Merge-writes `patch` into a persisted entry and refreshes it.
    pub async fn apply_patch(&self, id: &EntryId, patch: EntryPatch) -> TrackerResult<Entry> {
        let tracker = self.clone();
        let id = id.clone();
        self.run_detached(async move { tracker.patch_now(id, patch).await })
            .await
    }

    /// Removes a persisted entry from the store and the collection.
    ///
    /// Deleting an id that is already gone succeeds.
    pub async fn delete_entry(&self, id: &EntryId) -> TrackerResult<()> {
        let tracker = self.clone();
        let id = id.clone();
        self.run_detached(async move { tracker.delete_now(id).await })
            .await
    }

    /// Drops an unsaved candidate. Local only; returns whether one existed.
    pub fn discard_candidate(&self, address: &str) -> bool {
        self.lock_state()
            .candidates
            .remove(&normalize_address(address))
            .is_some()
    }

    /// Adds a note to `entry` and commits it.
    ///
    /// Blank text returns `Ok(false)` without any store call. On success
    /// `entry` is replaced with the stored copy; on failure it keeps the new
    /// note so the caller can retry.
    pub async fn add_note(&self, entry: &mut Entry, text: &str) -> TrackerResult<bool> {
        if !stage_note(entry, text) {
            return Ok(false);
        }
        *entry = self.commit(entry).await?;
        Ok(true)
    }

    /// `add_note` on behalf of a view scope.
    ///
    /// When `scope` is cancelled before the write finishes the result is
    /// `Ignored` and `entry` keeps the locally added note.
    pub async fn add_note_in(
        &self,
        scope: &CancellationToken,
        entry: &mut Entry,
        text: &str,
    ) -> Completion<TrackerResult<bool>> {
        if !stage_note(entry, text) {
            return Completion::Delivered(Ok(false));
        }
        self.commit_staged_in(scope, entry).await
    }

    /// Removes the note at `position` and commits.
    ///
    /// Out-of-range positions return `Ok(false)` without any store call.
    pub async fn delete_note(&self, entry: &mut Entry, position: usize) -> TrackerResult<bool> {
        if !stage_note_removal(entry, position) {
            return Ok(false);
        }
        *entry = self.commit(entry).await?;
        Ok(true)
    }

    /// `delete_note` on behalf of a view scope.
    pub async fn delete_note_in(
        &self,
        scope: &CancellationToken,
        entry: &mut Entry,
        position: usize,
    ) -> Completion<TrackerResult<bool>> {
        if !stage_note_removal(entry, position) {
            return Completion::Delivered(Ok(false));
        }
        self.commit_staged_in(scope, entry).await
    }

    /// Snapshot of persisted entries in collection order.
    pub fn entries(&self) -> Vec<Entry> {
        self.lock_state().entries.clone()
    }

    /// Snapshot with the revision it was taken at.
    pub fn snapshot(&self) -> (u64, Vec<Entry>) {
        let state = self.lock_state();
        (state.revision, state.entries.clone())
    }

    /// Unsaved candidates, in no particular order.
    pub fn candidates(&self) -> Vec<Entry> {
        self.lock_state().candidates.values().cloned().collect()
    }

    /// Bumped on every collection change.
    pub fn revision(&self) -> u64 {
        self.lock_state().revision
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Markers for every persisted entry.
    pub fn markers(&self) -> Vec<Marker> {
        self.lock_state()
            .entries
            .iter()
            .filter_map(Marker::for_entry)
            .collect()
    }

    async fn commit_staged_in(
        &self,
        scope: &CancellationToken,
        entry: &mut Entry,
    ) -> Completion<TrackerResult<bool>> {
        match self.commit_in(scope, entry).await {
            Completion::Ignored => Completion::Ignored,
            Completion::Delivered(Ok(stored)) => {
                *entry = stored;
                Completion::Delivered(Ok(true))
            }
            Completion::Delivered(Err(err)) => Completion::Delivered(Err(err)),
        }
    }

    async fn commit_now(&self, entry: Entry) -> TrackerResult<Entry> {
        let key = entry
            .id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| entry.address_key());
        let started_at = Instant::now();

        let guard = self.acquire_commit_lock(&key).await;
        let result = self.write_through(&entry).await;
        if let Ok(stored) = &result {
            self.lock_state().install(stored.clone(), &entry.address_key());
        }
        drop(guard);
        self.release_commit_lock(&key);

        match result {
            Ok(stored) => {
                info!(
                    "event=entry_commit module=tracker status=ok created={} notes={} duration_ms={}",
                    entry.id.is_none(),
                    stored.notes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(stored)
            }
            Err(err) => {
                error!(
                    "event=entry_commit module=tracker status=error created={} duration_ms={} error={err}",
                    entry.id.is_none(),
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    async fn write_through(&self, entry: &Entry) -> TrackerResult<Entry> {
        let store = &self.inner.store;
        let id = store.upsert_entry(entry.id.as_ref(), entry).await?;
        if entry.id.as_ref().is_some_and(|prior| *prior != id) {
            return Err(TrackerError::InconsistentState(
                "store reassigned the id of a persisted entry",
            ));
        }
        store
            .get_entry(&id)
            .await?
            .ok_or(TrackerError::InconsistentState(
                "committed entry not found in read-back",
            ))
    }

    async fn patch_now(&self, id: EntryId, patch: EntryPatch) -> TrackerResult<Entry> {
        let started_at = Instant::now();
        let guard = self.acquire_commit_lock(id.as_str()).await;
        let result = async {
            patch.validate()?;
            self.inner.store.merge_entry(&id, &patch).await?;
            self.inner
                .store
                .get_entry(&id)
                .await?
                .ok_or(TrackerError::InconsistentState(
                    "patched entry not found in read-back",
                ))
        }
        .await;
        if let Ok(stored) = &result {
            self.lock_state().install(stored.clone(), &stored.address_key());
        }
        drop(guard);
        self.release_commit_lock(id.as_str());

        match result {
            Ok(stored) => {
                info!(
                    "event=entry_patch module=tracker status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(stored)
            }
            Err(err) => {
                error!(
                    "event=entry_patch module=tracker status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    async fn delete_now(&self, id: EntryId) -> TrackerResult<()> {
        let started_at = Instant::now();
        let guard = self.acquire_commit_lock(id.as_str()).await;
        let result = self.inner.store.delete_entry(&id).await.map(|()| {
            let mut state = self.lock_state();
            let before = state.entries.len();
            state.entries.retain(|entry| entry.id.as_ref() != Some(&id));
            let removed = state.entries.len() != before;
            if removed {
                state.revision += 1;
            }
            removed
        });
        drop(guard);
        self.release_commit_lock(id.as_str());

        let removed = match result {
            Ok(removed) => removed,
            Err(err) => {
                error!(
                    "event=entry_delete module=tracker status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(err.into());
            }
        };
        info!(
            "event=entry_delete module=tracker status=ok removed={removed} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    async fn run_detached<T, F>(&self, operation: F) -> TrackerResult<T>
    where
        T: Send + 'static,
        F: Future<Output = TrackerResult<T>> + Send + 'static,
    {
        tokio::spawn(operation)
            .await
            .map_err(|err| TrackerError::Task(err.to_string()))?
    }

    async fn acquire_commit_lock(&self, key: &str) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        if !self.inner.serialize_commits {
            return None;
        }
        let lock = {
            let mut locks = self
                .inner
                .commit_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        Some(lock.lock_owned().await)
    }

    /// Drops the per-key lock once no writer holds or waits on it.
    fn release_commit_lock(&self, key: &str) {
        if !self.inner.serialize_commits {
            return;
        }
        let mut locks = self
            .inner
            .commit_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(key);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn stage_note(entry: &mut Entry, text: &str) -> bool {
    let Some(note) = Note::new(text) else {
        debug!("event=note_add module=tracker status=rejected reason=blank_text");
        return false;
    };
    insert_note(&mut entry.notes, note);
    true
}

fn stage_note_removal(entry: &mut Entry, position: usize) -> bool {
    if remove_note(&mut entry.notes, position).is_none() {
        debug!(
            "event=note_delete module=tracker status=ignored reason=out_of_range position={position} len={}",
            entry.notes.len()
        );
        return false;
    }
    true
}
