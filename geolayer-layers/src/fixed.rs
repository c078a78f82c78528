//! Fixed strategy: load the layer's features once.

use std::sync::atomic::{AtomicBool, Ordering};

/// Loads the whole feature set on first request and never again on its own.
///
/// [`crate::VectorLayer::refresh`] bypasses it and re-reads unconditionally.
#[derive(Debug, Default)]
pub struct FixedStrategy {
    loaded: AtomicBool,
}

impl FixedStrategy {
    /// A strategy that has not loaded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the layer has been loaded at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Claim the first load. Returns `false` if a load already happened
    /// or is in flight.
    pub(crate) fn begin(&self) -> bool {
        !self.loaded.swap(true, Ordering::SeqCst)
    }

    /// Give the claim back after a failed load so the next call retries.
    pub(crate) fn reset(&self) {
        self.loaded.store(false, Ordering::SeqCst);
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }
}
