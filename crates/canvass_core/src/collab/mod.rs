//! Contracts for external collaborators.
//!
//! # Responsibility
//! - Describe what the core needs from the geocoder, the sign-in session
//!   and the map widget, without depending on any vendor SDK.
//!
//! # Invariants
//! - Geocoding failure is never an error for callers; it falls back to a
//!   coordinate label.

pub mod auth;
pub mod geocode;
pub mod map;
