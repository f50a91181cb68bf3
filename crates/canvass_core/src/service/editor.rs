//! Entry form view model.
//!
//! # Responsibility
//! - Hold the in-progress draft for one entry and route its actions through
//!   the tracker.
//! - Turn tracker failures into a non-blocking notice.
//!
//! # Invariants
//! - A failed write never rolls back the draft; the user may retry.
//! - Results arriving after `close` are ignored and leave the draft alone.
//! - Edits to an unsaved candidate are mirrored into the tracker, so the
//!   next click on the same address reopens them.

use crate::cancel::{CancellationToken, Completion};
use crate::model::entry::{Entry, VisitStatus};
use crate::service::tracker::{Tracker, TrackerError, TrackerResult};
use log::warn;

/// What an editor action did, from the form's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorOutcome {
    /// Stored; the draft now mirrors the store.
    Saved,
    /// Input rejected locally (blank note, bad position); nothing written.
    Unchanged,
    /// Entry removed (or candidate discarded).
    Deleted,
    /// Write failed; the notice is also kept on the editor.
    Failed(String),
    /// The editor was closed before the write finished.
    Detached,
}

/// Draft-holding form for one entry.
pub struct EntryEditor {
    tracker: Tracker,
    draft: Entry,
    scope: CancellationToken,
    notice: Option<String>,
}

impl EntryEditor {
    pub fn open(tracker: Tracker, entry: Entry) -> Self {
        Self {
            tracker,
            draft: entry,
            scope: CancellationToken::new(),
            notice: None,
        }
    }

    pub fn draft(&self) -> &Entry {
        &self.draft
    }

    /// Last failure notice, cleared by the next successful write.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Token tied to this editor's lifetime, for work spawned on its behalf.
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub fn set_status(&mut self, status: VisitStatus) {
        self.draft.status = status;
        self.sync_candidate();
    }

    pub fn set_homeowner_name(&mut self, value: impl Into<String>) {
        self.draft.homeowner_name = value.into();
        self.sync_candidate();
    }

    pub fn set_phone_number(&mut self, value: impl Into<String>) {
        self.draft.phone_number = value.into();
        self.sync_candidate();
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.draft.email = value.into();
        self.sync_candidate();
    }

    /// Saves the draft as it stands.
    pub async fn save(&mut self) -> EditorOutcome {
        let completion = self.tracker.commit_in(&self.scope, &self.draft).await;
        self.settle(completion)
    }

    /// Prepends a note and saves. Blank text is ignored.
    pub async fn add_note(&mut self, text: &str) -> EditorOutcome {
        let completion = self
            .tracker
            .add_note_in(&self.scope, &mut self.draft, text)
            .await;
        self.settle_note_edit(completion)
    }

    /// Removes the note at `position` and saves. Out of range is ignored.
    pub async fn delete_note(&mut self, position: usize) -> EditorOutcome {
        let completion = self
            .tracker
            .delete_note_in(&self.scope, &mut self.draft, position)
            .await;
        self.settle_note_edit(completion)
    }

    /// Deletes the entry and closes the editor.
    ///
    /// For an unsaved candidate this only discards it locally. A failed
    /// delete leaves the editor open for a retry.
    pub async fn delete(&mut self) -> EditorOutcome {
        let Some(id) = self.draft.id.clone() else {
            self.tracker.discard_candidate(&self.draft.address);
            self.close();
            return EditorOutcome::Deleted;
        };
        match self.tracker.delete_entry(&id).await {
            Ok(()) => {
                self.close();
                EditorOutcome::Deleted
            }
            Err(err) => self.fail(err),
        }
    }

    /// Closes the view; in-flight results are ignored from now on.
    pub fn close(&mut self) {
        self.scope.cancel();
    }

    fn settle(&mut self, completion: Completion<TrackerResult<Entry>>) -> EditorOutcome {
        match completion {
            Completion::Ignored => EditorOutcome::Detached,
            Completion::Delivered(Ok(stored)) => {
                self.draft = stored;
                self.notice = None;
                EditorOutcome::Saved
            }
            Completion::Delivered(Err(err)) => self.fail(err),
        }
    }

    fn settle_note_edit(&mut self, completion: Completion<TrackerResult<bool>>) -> EditorOutcome {
        match completion {
            Completion::Ignored => EditorOutcome::Detached,
            Completion::Delivered(Ok(false)) => EditorOutcome::Unchanged,
            Completion::Delivered(Ok(true)) => {
                self.notice = None;
                EditorOutcome::Saved
            }
            Completion::Delivered(Err(err)) => self.fail(err),
        }
    }

    /// Mirrors an unsaved draft into the tracker's pending candidate.
    fn sync_candidate(&self) {
        if !self.draft.is_persisted() {
            self.tracker.update_candidate(&self.draft);
        }
    }

    fn fail(&mut self, err: TrackerError) -> EditorOutcome {
        self.sync_candidate();
        warn!("event=editor_write module=editor status=error error={err}");
        let notice = format!("Could not save changes: {err}");
        self.notice = Some(notice.clone());
        EditorOutcome::Failed(notice)
    }
}

impl Drop for EntryEditor {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
