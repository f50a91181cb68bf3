//! Use-case services over the record store.
//!
//! # Responsibility
//! - Reconcile map interactions and edits with persisted entries.
//! - Keep views decoupled from storage details.

pub mod editor;
pub mod notes;
pub mod tracker;
