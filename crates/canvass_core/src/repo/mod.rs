//! Record store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the async document-store contract the tracker writes through.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Writes validate the entry before touching storage.
//! - Deletes are idempotent: an absent key is a successful no-op.
//! - Upserts never rewrite `created_at`, address or coordinates.

pub mod entry_store;
