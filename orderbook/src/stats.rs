//! Operation counters, readable without taking the book lock.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Internal atomic counters. All accesses are relaxed; readers may observe
/// values momentarily behind the authoritative book state.
#[derive(Debug, Default)]
pub(crate) struct BookCounters {
    pub(crate) orders_processed: AtomicU64,
    pub(crate) fills_generated: AtomicU64,
    pub(crate) last_processing_time_ns: AtomicU64,
}

impl BookCounters {
    pub(crate) fn snapshot(&self) -> BookStats {
        BookStats {
            orders_processed: self.orders_processed.load(Ordering::Relaxed),
            fills_generated: self.fills_generated.load(Ordering::Relaxed),
            last_processing_time_ns: self.last_processing_time_ns.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.orders_processed.store(0, Ordering::Relaxed);
        self.fills_generated.store(0, Ordering::Relaxed);
        self.last_processing_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of the book's counters.
///
/// `orders_processed` and `fills_generated` are monotonically non-decreasing
/// between resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStats {
    pub orders_processed: u64,
    pub fills_generated: u64,
    /// Wall-clock duration of the most recent submission.
    pub last_processing_time_ns: u64,
}
