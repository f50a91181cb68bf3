//! Note ledger embedded in each entry.
//!
//! # Responsibility
//! - Build timestamped notes and keep the ledger ordering policy in one
//!   place.
//!
//! # Invariants
//! - Newest note is always at position 0.
//! - Blank text never enters the ledger.
//! - The ledger is only persisted as part of a whole-entry write, so two
//!   sessions editing the same entry race at entry granularity and the later
//!   write wins.

use crate::model::entry::Note;
use chrono::Local;

/// Timestamp format for notes, in client local time.
pub const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl Note {
    /// Creates a note stamped with the current local time.
    ///
    /// Returns `None` for blank text. Surrounding whitespace is trimmed.
    pub fn new(text: &str) -> Option<Self> {
        if is_blank_note(text) {
            return None;
        }
        Some(Self {
            text: text.trim().to_string(),
            timestamp: Local::now().format(NOTE_TIMESTAMP_FORMAT).to_string(),
        })
    }
}

/// Whether `text` would be rejected as a note.
pub fn is_blank_note(text: &str) -> bool {
    text.trim().is_empty()
}

/// Inserts `note` as the newest ledger item.
pub fn insert_note(notes: &mut Vec<Note>, note: Note) {
    notes.insert(0, note);
}

/// Removes the note at `position`; out-of-range positions leave the ledger
/// untouched and return `None`.
pub fn remove_note(notes: &mut Vec<Note>, position: usize) -> Option<Note> {
    if position < notes.len() {
        Some(notes.remove(position))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{insert_note, is_blank_note, remove_note, NOTE_TIMESTAMP_FORMAT};
    use crate::model::entry::Note;
    use chrono::NaiveDateTime;

    fn note(text: &str) -> Note {
        Note {
            text: text.to_string(),
            timestamp: "2024-06-01 12:00:00".to_string(),
        }
    }

    #[test]
    fn new_note_trims_text_and_formats_timestamp() {
        let created = Note::new("  spoke to owner ").expect("non-blank note");
        assert_eq!(created.text, "spoke to owner");
        assert!(NaiveDateTime::parse_from_str(&created.timestamp, NOTE_TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(is_blank_note(" \t\n"));
        assert!(Note::new("   ").is_none());
    }

    #[test]
    fn newest_note_goes_first() {
        let mut notes = vec![note("first")];
        insert_note(&mut notes, note("second"));
        let texts: Vec<&str> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn out_of_range_removal_is_a_no_op() {
        let mut notes = vec![note("only")];
        assert!(remove_note(&mut notes, 1).is_none());
        assert_eq!(notes.len(), 1);

        let removed = remove_note(&mut notes, 0).expect("in range");
        assert_eq!(removed.text, "only");
        assert!(notes.is_empty());
    }
}
