use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation, polled by the extractor before each file.
pub trait CancellationToken {
    fn is_cancellation_requested(&self) -> bool;
}

/// A token that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationToken for NeverCancel {
    fn is_cancellation_requested(&self) -> bool {
        false
    }
}

/// Shareable flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl CancellationToken for CancellationFlag {
    fn is_cancellation_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl<F> CancellationToken for F
where
    F: Fn() -> bool,
{
    fn is_cancellation_requested(&self) -> bool {
        self()
    }
}
