//! Domain model for canvassed addresses.
//!
//! # Responsibility
//! - Define the canonical `Entry` record and its embedded `Note` ledger.
//! - Own address normalization, the identity rule for every record.
//!
//! # Invariants
//! - At most one entry exists per normalized address.
//! - An entry `id`, once assigned, is never reassigned.
//! - Deletion is terminal; there are no tombstones.

pub mod address;
pub mod entry;
