//! View-lifetime cancellation.
//!
//! A token is created per open view and cancelled when the view goes away.
//! Work already handed to the tracker still runs to completion; the token
//! only decides whether its result is delivered back to the view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result of an operation awaited on behalf of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    /// The view is still open and receives the result.
    Delivered(T),
    /// The view closed while the operation was in flight.
    Ignored,
}

impl<T> Completion<T> {
    pub fn delivered(self) -> Option<T> {
        match self {
            Self::Delivered(value) => Some(value),
            Self::Ignored => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}
