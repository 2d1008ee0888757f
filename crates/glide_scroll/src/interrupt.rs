//! User interruption signal
//!
//! A shared flag raised by wheel input and read by every running animation
//! that opted into `stop_for_interruptions`. The scroll host owns one signal
//! and hands clones of it to each run, so independent hosts never see each
//! other's input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "the user is scrolling" flag
#[derive(Clone, Debug, Default)]
pub struct InterruptionSignal {
    raised: Arc<AtomicBool>,
}

impl InterruptionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that the user produced wheel/scroll input
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Clear the flag (done at the start of every animation)
    pub fn reset(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Check if two signals share the same flag
    pub fn same_as(&self, other: &InterruptionSignal) -> bool {
        Arc::ptr_eq(&self.raised, &other.raised)
    }
}
