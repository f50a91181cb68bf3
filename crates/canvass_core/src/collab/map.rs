//! Map widget contract: markers out, interactions in.

use crate::model::entry::{Coordinates, Entry, EntryId, VisitStatus};

/// Interaction reported by the map widget.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Click on empty map space.
    Click(Coordinates),
    /// Click on an existing marker.
    MarkerClick(EntryId),
}

/// Marker the widget should render for one persisted entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: EntryId,
    pub location: Coordinates,
    pub glyph: &'static str,
    pub title: String,
}

impl Marker {
    /// Marker for a persisted entry; candidates have no marker.
    pub fn for_entry(entry: &Entry) -> Option<Self> {
        let id = entry.id.clone()?;
        Some(Self {
            id,
            location: entry.location,
            glyph: marker_glyph(entry.status),
            title: entry.address.clone(),
        })
    }
}

/// Glyph drawn for each visit status.
pub fn marker_glyph(status: VisitStatus) -> &'static str {
    match status {
        VisitStatus::Unset => "📍",
        VisitStatus::Answered => "✅",
        VisitStatus::CallBack => "📞",
        VisitStatus::NotInterested => "❌",
        VisitStatus::NotHome => "🏠",
        VisitStatus::Inaccessible => "🚫",
    }
}

#[cfg(test)]
mod tests {
    use super::{marker_glyph, Marker};
    use crate::model::entry::{Coordinates, Entry, EntryId, VisitStatus};
    use std::collections::HashSet;

    #[test]
    fn every_status_has_a_distinct_glyph() {
        let glyphs: HashSet<&str> = VisitStatus::ALL.into_iter().map(marker_glyph).collect();
        assert_eq!(glyphs.len(), VisitStatus::ALL.len());
    }

    #[test]
    fn candidates_have_no_marker() {
        let mut entry = Entry::candidate(Coordinates::new(3.0, 4.0), "4 Pine Ct");
        assert!(Marker::for_entry(&entry).is_none());

        entry.id = Some(EntryId::for_address(&entry.address));
        entry.status = VisitStatus::NotHome;
        let marker = Marker::for_entry(&entry).expect("persisted entry");
        assert_eq!(marker.glyph, "🏠");
        assert_eq!(marker.id.as_str(), "4-pine-ct");
    }
}
