//! Core logic for the door-to-door canvassing tracker.
//! This crate owns entry identity, reconciliation and list shaping; maps,
//! geocoding and sign-in are reached through collaborator contracts.

pub mod cancel;
pub mod collab;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use cancel::{CancellationToken, Completion};
pub use collab::auth::{guard, AuthProvider, AuthState, GuardDecision};
pub use collab::geocode::{resolve_address, GeocodeError, Geocoder, OfflineGeocoder};
pub use collab::map::{marker_glyph, MapEvent, Marker};
pub use config::{load_config, ConfigError, TrackerConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::address::{coordinate_label, normalize_address};
pub use model::entry::{
    Coordinates, Entry, EntryDocument, EntryId, EntryPatch, EntryValidationError, Note,
    VisitStatus,
};
pub use repo::entry_store::{RecordStore, SqliteRecordStore, StoreError, StoreResult};
pub use search::list_view::{filter_entries, query_entries, sort_entries, ListView, SortKey};
pub use service::editor::{EditorOutcome, EntryEditor};
pub use service::tracker::{Tracker, TrackerError, TrackerResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
