//! Filtering and sorting for the entries list.
//!
//! # Invariants
//! - Filtering is a case-insensitive substring match on address or
//!   homeowner name; a blank filter keeps everything.
//! - Sorting is stable and case-insensitive. Empty values compare equal to
//!   each other and sort after every non-empty value.

use crate::model::entry::Entry;
use crate::service::tracker::Tracker;
use std::cmp::Ordering;

/// Field the list is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Address,
    Status,
    HomeownerName,
}

impl SortKey {
    /// Parses the option names used by list controls.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "address" => Some(Self::Address),
            "status" => Some(Self::Status),
            "homeownername" | "homeowner_name" | "homeowner" => Some(Self::HomeownerName),
            _ => None,
        }
    }

    fn field(self, entry: &Entry) -> &str {
        match self {
            Self::Address => entry.address.as_str(),
            Self::Status => entry.status.label(),
            Self::HomeownerName => entry.homeowner_name.as_str(),
        }
    }
}

/// Entries whose address or homeowner name contains `term`, ignoring case.
pub fn filter_entries<'a>(entries: &'a [Entry], term: &str) -> Vec<&'a Entry> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return entries.iter().collect();
    }
    entries
        .iter()
        .filter(|entry| {
            entry.address.to_lowercase().contains(&needle)
                || entry.homeowner_name.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Stable sort by `key`.
pub fn sort_entries(entries: &mut [&Entry], key: SortKey) {
    entries.sort_by(|left, right| compare_field(key.field(left), key.field(right)));
}

fn compare_field(left: &str, right: &str) -> Ordering {
    let left = left.trim();
    let right = right.trim();
    match (left.is_empty(), right.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.to_lowercase().cmp(&right.to_lowercase()),
    }
}

/// Filter then sort, as the list renders it.
pub fn query_entries<'a>(entries: &'a [Entry], term: &str, key: SortKey) -> Vec<&'a Entry> {
    let mut visible = filter_entries(entries, term);
    sort_entries(&mut visible, key);
    visible
}

/// Memoized list state: recomputes only when the collection revision, the
/// filter text or the sort key changes.
#[derive(Debug, Default)]
pub struct ListView {
    filter: String,
    sort: SortKey,
    computed_for: Option<(u64, String, SortKey)>,
    rows: Vec<Entry>,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Current rows for `tracker`, recomputed if any input changed.
    pub fn rows(&mut self, tracker: &Tracker) -> &[Entry] {
        let revision = tracker.revision();
        let inputs = (revision, self.filter.clone(), self.sort);
        if self.computed_for.as_ref() != Some(&inputs) {
            let (revision, entries) = tracker.snapshot();
            self.rows = query_entries(&entries, &self.filter, self.sort)
                .into_iter()
                .cloned()
                .collect();
            self.computed_for = Some((revision, self.filter.clone(), self.sort));
        }
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_field, filter_entries, query_entries, SortKey};
    use crate::model::entry::{Coordinates, Entry, VisitStatus};
    use std::cmp::Ordering;

    fn entry(address: &str, homeowner: &str, status: VisitStatus) -> Entry {
        let mut entry = Entry::candidate(Coordinates::new(0.0, 0.0), address);
        entry.homeowner_name = homeowner.to_string();
        entry.status = status;
        entry
    }

    #[test]
    fn filter_matches_address_substring_ignoring_case() {
        let entries = vec![
            entry("123 Main St", "", VisitStatus::Unset),
            entry("5 Oak Ave", "", VisitStatus::Unset),
        ];
        let hits = filter_entries(&entries, "ain");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].address, "123 Main St");
    }

    #[test]
    fn filter_matches_homeowner_and_blank_keeps_all() {
        let entries = vec![
            entry("1 A St", "Robin Ortiz", VisitStatus::Unset),
            entry("2 B St", "", VisitStatus::Unset),
        ];
        assert_eq!(filter_entries(&entries, "ORTIZ").len(), 1);
        assert_eq!(filter_entries(&entries, "  ").len(), 2);
    }

    #[test]
    fn sort_by_status_uses_labels() {
        let entries = vec![
            entry("1 A St", "", VisitStatus::NotHome),
            entry("2 B St", "", VisitStatus::Answered),
        ];
        let sorted = query_entries(&entries, "", SortKey::Status);
        let labels: Vec<&str> = sorted.iter().map(|e| e.status.label()).collect();
        assert_eq!(labels, vec!["Answered", "Not Home"]);
    }

    #[test]
    fn empty_values_are_equal_and_sort_last_stably() {
        assert_eq!(compare_field("", "  "), Ordering::Equal);
        assert_eq!(compare_field("", "a"), Ordering::Greater);

        let entries = vec![
            entry("first", "", VisitStatus::Unset),
            entry("second", "Zed", VisitStatus::Unset),
            entry("third", "", VisitStatus::Unset),
            entry("fourth", "amy", VisitStatus::Unset),
        ];
        let sorted = query_entries(&entries, "", SortKey::HomeownerName);
        let addresses: Vec<&str> = sorted.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["fourth", "second", "first", "third"]);
    }

    #[test]
    fn sort_key_parses_control_values() {
        assert_eq!(SortKey::parse("homeownerName"), Some(SortKey::HomeownerName));
        assert_eq!(SortKey::parse("STATUS"), Some(SortKey::Status));
        assert_eq!(SortKey::parse("zip"), None);
    }
}
