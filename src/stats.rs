//! Collection statistics
//!
//! Read-only counters updated once per [`crate::collector::collect`] call,
//! purely for observability: nothing in the collector's correctness depends
//! on them. The reference runtime this collector is modeled on keeps its
//! equivalent lifecycle counters (`TOTAL_SPAWNED`, `PEAK_STRANDS`, ...) as
//! `AtomicUsize`/`AtomicU64` because it is multi-threaded; this collector is
//! single-threaded and stop-the-world (§5), and only `collect` itself ever
//! writes these fields, so plain `Cell`-free globals are the honest
//! translation of that idiom here rather than atomics nothing else touches.

use std::sync::atomic::{AtomicU64, Ordering};

/// Number of completed `collect` calls.
static COLLECTIONS_RUN: AtomicU64 = AtomicU64::new(0);
/// Bytes live in the active space after the most recent collection.
static BYTES_LIVE: AtomicU64 = AtomicU64::new(0);
/// Bytes reclaimed by the most recent collection (occupancy before minus
/// bytes live after).
static BYTES_RECLAIMED: AtomicU64 = AtomicU64::new(0);
/// High-water mark of `BYTES_LIVE` across every collection so far.
static PEAK_BYTES_LIVE: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the counters at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub collections_run: u64,
    pub bytes_live: u64,
    pub bytes_reclaimed: u64,
    pub peak_bytes_live: u64,
}

/// Record the outcome of a completed collection.
///
/// `bytes_before` is the from-space occupancy (`free_ptr - fromspace_begin`,
/// in bytes) just before the collection began.
pub(crate) fn record_collection(bytes_before: u64, bytes_live: u64) {
    COLLECTIONS_RUN.fetch_add(1, Ordering::Relaxed);
    BYTES_LIVE.store(bytes_live, Ordering::Relaxed);
    BYTES_RECLAIMED.store(bytes_before.saturating_sub(bytes_live), Ordering::Relaxed);

    let mut peak = PEAK_BYTES_LIVE.load(Ordering::Relaxed);
    while bytes_live > peak {
        match PEAK_BYTES_LIVE.compare_exchange_weak(
            peak,
            bytes_live,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(current) => peak = current,
        }
    }
}

/// Read the current collection statistics.
pub fn stats() -> CollectionStats {
    CollectionStats {
        collections_run: COLLECTIONS_RUN.load(Ordering::Relaxed),
        bytes_live: BYTES_LIVE.load(Ordering::Relaxed),
        bytes_reclaimed: BYTES_RECLAIMED.load(Ordering::Relaxed),
        peak_bytes_live: PEAK_BYTES_LIVE.load(Ordering::Relaxed),
    }
}
