//! List view search and ordering.
//!
//! # Responsibility
//! - Filter and sort the tracker collection for the entries list.
//! - Keep list shaping pure and synchronous.

pub mod list_view;
