//! Shared shutdown flag

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable flag connecting signal handlers to backoff waits.
///
/// The reader polls it during the idle backoff so an external shutdown
/// request cuts the wait short instead of sleeping it out.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// The underlying atomic, for `signal_hook::flag::register`
    pub fn atomic(&self) -> &Arc<AtomicBool> {
        &self.0
    }
}
