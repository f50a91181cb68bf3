//! Entry domain model.
//!
//! # Responsibility
//! - Define the canonical record for one canvassed address.
//! - Provide the single default-filling constructor for loosely-typed
//!   documents (`Entry::from_document`).
//!
//! # Invariants
//! - `id` is `None` only for candidates that were never persisted.
//! - `notes` never holds blank text.
//! - Coordinates are finite and never change after the entry exists.

use crate::model::address::normalize_address;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key of a persisted entry.
///
/// Always the normalized address the entry was first saved under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Key a candidate with this address would be stored under.
    pub fn for_address(address: &str) -> Self {
        Self(normalize_address(address))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Outcome of the most recent knock at an address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Nothing recorded yet.
    #[default]
    Unset,
    Answered,
    CallBack,
    NotInterested,
    NotHome,
    Inaccessible,
}

impl VisitStatus {
    pub const ALL: [VisitStatus; 6] = [
        VisitStatus::Unset,
        VisitStatus::Answered,
        VisitStatus::CallBack,
        VisitStatus::NotInterested,
        VisitStatus::NotHome,
        VisitStatus::Inaccessible,
    ];

    /// Storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Answered => "answered",
            Self::CallBack => "call_back",
            Self::NotInterested => "not_interested",
            Self::NotHome => "not_home",
            Self::Inaccessible => "inaccessible",
        }
    }

    /// Human label shown in forms and lists. Empty for `Unset`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Answered => "Answered",
            Self::CallBack => "Call Back",
            Self::NotInterested => "Not Interested",
            Self::NotHome => "Not Home",
            Self::Inaccessible => "Inaccessible",
        }
    }

    /// Parses a storage code or a human label, ignoring case.
    ///
    /// Blank input is `Unset`; unknown text is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Some(Self::Unset);
        }
        Self::ALL.into_iter().find(|status| {
            status.code().eq_ignore_ascii_case(trimmed)
                || status.label().eq_ignore_ascii_case(trimmed)
        })
    }

    pub fn is_unset(self) -> bool {
        self == Self::Unset
    }
}

/// One timestamped remark left at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    /// Client local time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
}

/// Validation failures for entry writes.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValidationError {
    /// Latitude or longitude is NaN or infinite.
    NonFiniteCoordinates { lat: f64, lng: f64 },
    /// A note at `position` has blank text.
    BlankNote { position: usize },
    /// A loosely-typed document is missing a required field.
    MissingField(&'static str),
    /// A status value is not one of the known codes or labels.
    UnknownStatus(String),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteCoordinates { lat, lng } => {
                write!(f, "coordinates must be finite, got ({lat}, {lng})")
            }
            Self::BlankNote { position } => write!(f, "note at position {position} is blank"),
            Self::MissingField(field) => write!(f, "entry document is missing `{field}`"),
            Self::UnknownStatus(value) => write!(f, "unknown visit status `{value}`"),
        }
    }
}

impl Error for EntryValidationError {}

/// Canonical record for one tracked address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Option<EntryId>,
    pub address: String,
    pub location: Coordinates,
    pub status: VisitStatus,
    pub homeowner_name: String,
    pub phone_number: String,
    pub email: String,
    /// Newest first.
    pub notes: Vec<Note>,
    /// Epoch milliseconds of first persistence; set by the store.
    pub created_at: Option<i64>,
}

impl Entry {
    /// Creates an unsaved candidate with default fields.
    pub fn candidate(location: Coordinates, address: impl Into<String>) -> Self {
        Self {
            id: None,
            address: address.into(),
            location,
            status: VisitStatus::Unset,
            homeowner_name: String::new(),
            phone_number: String::new(),
            email: String::new(),
            notes: Vec::new(),
            created_at: None,
        }
    }

    /// Normalized address used for deduplication.
    pub fn address_key(&self) -> String {
        normalize_address(&self.address)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Builds an entry from a loosely-typed document, filling defaults for
    /// every absent optional field and keeping every present one.
    ///
    /// # Errors
    /// - `MissingField` when `address`, `lat` or `lng` is absent.
    /// - `UnknownStatus` for unrecognised status text.
    /// - Any `validate()` failure.
    pub fn from_document(document: EntryDocument) -> Result<Self, EntryValidationError> {
        let address = document
            .address
            .ok_or(EntryValidationError::MissingField("address"))?;
        let lat = document
            .lat
            .ok_or(EntryValidationError::MissingField("lat"))?;
        let lng = document
            .lng
            .ok_or(EntryValidationError::MissingField("lng"))?;
        let status = match document.status {
            Some(value) => VisitStatus::parse(&value)
                .ok_or(EntryValidationError::UnknownStatus(value))?,
            None => VisitStatus::Unset,
        };

        let entry = Self {
            id: document.id.map(EntryId::new),
            address,
            location: Coordinates::new(lat, lng),
            status,
            homeowner_name: document.homeowner_name.unwrap_or_default(),
            phone_number: document.phone_number.unwrap_or_default(),
            email: document.email.unwrap_or_default(),
            notes: document.notes.unwrap_or_default(),
            created_at: document.created_at,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Presence checks required before any write.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if !self.location.is_finite() {
            return Err(EntryValidationError::NonFiniteCoordinates {
                lat: self.location.lat,
                lng: self.location.lng,
            });
        }
        if let Some(position) = self
            .notes
            .iter()
            .position(|note| note.text.trim().is_empty())
        {
            return Err(EntryValidationError::BlankNote { position });
        }
        Ok(())
    }
}

/// Loosely-typed entry as handed back by a document store or marker payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryDocument {
    pub id: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub status: Option<String>,
    pub homeowner_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub notes: Option<Vec<Note>>,
    pub created_at: Option<i64>,
}

/// Partial update; `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub status: Option<VisitStatus>,
    pub homeowner_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub notes: Option<Vec<Note>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.homeowner_name.is_none()
            && self.phone_number.is_none()
            && self.email.is_none()
            && self.notes.is_none()
    }

    /// Applies the patch to an in-memory copy.
    pub fn apply_to(&self, entry: &mut Entry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(value) = &self.homeowner_name {
            entry.homeowner_name = value.clone();
        }
        if let Some(value) = &self.phone_number {
            entry.phone_number = value.clone();
        }
        if let Some(value) = &self.email {
            entry.email = value.clone();
        }
        if let Some(notes) = &self.notes {
            entry.notes = notes.clone();
        }
    }

    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if let Some(position) = self
            .notes
            .iter()
            .flatten()
            .position(|note| note.text.trim().is_empty())
        {
            return Err(EntryValidationError::BlankNote { position });
        }
        Ok(())
    }
}
