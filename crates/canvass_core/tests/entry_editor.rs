mod support;

use canvass_core::{Coordinates, EditorOutcome, EntryEditor, VisitStatus};
use support::tracker_with_probe;

#[tokio::test]
async fn save_assigns_id_and_clears_notice() {
    let (tracker, store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "12 Brook Ln");
    let mut editor = EntryEditor::open(tracker.clone(), candidate);

    editor.set_status(VisitStatus::CallBack);
    editor.set_homeowner_name("Robin");

    store.set_failing(true);
    let failed = editor.save().await;
    assert!(matches!(failed, EditorOutcome::Failed(_)));
    assert!(editor.notice().unwrap().contains("permission denied"));
    assert_eq!(editor.draft().homeowner_name, "Robin");
    assert!(editor.draft().id.is_none());
    assert!(tracker.is_empty());

    store.set_failing(false);
    assert_eq!(editor.save().await, EditorOutcome::Saved);
    assert!(editor.notice().is_none());
    assert!(editor.draft().id.is_some());
    assert_eq!(tracker.entries()[0].status, VisitStatus::CallBack);
}

#[tokio::test]
async fn blank_and_out_of_range_note_edits_are_unchanged() {
    let (tracker, store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "5 Dune Rd");
    let mut editor = EntryEditor::open(tracker, candidate);

    assert_eq!(editor.add_note(" \t ").await, EditorOutcome::Unchanged);
    assert_eq!(editor.delete_note(0).await, EditorOutcome::Unchanged);
    assert_eq!(store.writes(), 0);

    assert_eq!(editor.add_note("no soliciting sign").await, EditorOutcome::Saved);
    assert_eq!(editor.draft().notes.len(), 1);
    assert_eq!(editor.delete_note(3).await, EditorOutcome::Unchanged);
    assert_eq!(editor.delete_note(0).await, EditorOutcome::Saved);
    assert!(editor.draft().notes.is_empty());
}

#[tokio::test]
async fn deleting_a_candidate_discards_it_locally() {
    let (tracker, store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "8 Glen Ave");
    let mut editor = EntryEditor::open(tracker.clone(), candidate);

    assert_eq!(editor.delete().await, EditorOutcome::Deleted);
    assert!(editor.is_closed());
    assert!(tracker.candidates().is_empty());
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn failed_delete_keeps_editor_open() {
    let (tracker, store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "31 Shore Dr");
    let stored = tracker.commit(&candidate).await.unwrap();
    let mut editor = EntryEditor::open(tracker.clone(), stored);

    store.set_failing(true);
    assert!(matches!(editor.delete().await, EditorOutcome::Failed(_)));
    assert!(!editor.is_closed());
    assert_eq!(tracker.len(), 1);

    store.set_failing(false);
    assert_eq!(editor.delete().await, EditorOutcome::Deleted);
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn closed_editor_ignores_results_but_write_lands() {
    let (tracker, _store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "2 Quarry St");
    let mut editor = EntryEditor::open(tracker.clone(), candidate);
    editor.set_email("owner@example.com");

    editor.close();
    assert_eq!(editor.save().await, EditorOutcome::Detached);
    assert!(editor.draft().id.is_none());
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.entries()[0].email, "owner@example.com");
}

#[tokio::test]
async fn dropping_the_editor_cancels_its_scope() {
    let (tracker, _store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "40 Mill Rd");
    let editor = EntryEditor::open(tracker, candidate);
    let scope = editor.scope();

    assert!(!scope.is_cancelled());
    drop(editor);
    assert!(scope.is_cancelled());
}

#[tokio::test]
async fn unsaved_edits_survive_a_second_click() {
    let (tracker, store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "77 Harbor Way");
    let mut editor = EntryEditor::open(tracker.clone(), candidate);
    editor.set_status(VisitStatus::CallBack);
    editor.set_homeowner_name("Robin");

    let reopened = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "77 harbor way");
    assert_eq!(reopened.status, VisitStatus::CallBack);
    assert_eq!(reopened.homeowner_name, "Robin");
    assert_eq!(&reopened, editor.draft());
    assert_eq!(store.writes(), 0);

    let mut second = EntryEditor::open(tracker.clone(), reopened);
    assert_eq!(second.save().await, EditorOutcome::Saved);
    assert_eq!(tracker.entries()[0].homeowner_name, "Robin");
}

#[tokio::test]
async fn failed_note_on_candidate_stays_pending() {
    let (tracker, store) = tracker_with_probe();
    let candidate = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "5 Crest Rd");
    let mut editor = EntryEditor::open(tracker.clone(), candidate);

    store.set_failing(true);
    assert!(matches!(editor.add_note("beware of dog").await, EditorOutcome::Failed(_)));
    assert_eq!(editor.draft().notes.len(), 1);

    let reopened = tracker.resolve_candidate(Coordinates::new(1.0, 2.0), "5 Crest Rd");
    assert_eq!(reopened.notes, editor.draft().notes);
}
