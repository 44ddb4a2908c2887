//! Cooperative cancellation for collection runs.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared by every task in a collection run.
///
/// Wrap in an `Arc` via [`CancelFlag::new`] and hand the same flag to the
/// collector and to whatever owns the run's lifetime. Tasks consult the flag
/// before each network call and between pages; once cancelled, pending calls
/// fail fast with a cancellation error that each task absorbs like any other
/// transient failure. Tasks are never interrupted mid-call and sibling tasks
/// are not torn down, they each observe the same flag independently.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    /// Create a new, un-cancelled flag.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Request cancellation of the run. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Error returned by call sites that observed the flag.
    pub(crate) fn as_error(&self) -> ohno::AppError {
        ohno::app_err!("collection cancelled")
    }
}
