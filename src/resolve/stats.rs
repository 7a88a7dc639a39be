//! Resolution Statistics
//!
//! Per-resolver counters for where lookups were satisfied. The resolver is
//! shared across tasks, so the counters are atomics rather than a guarded
//! struct.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Resolve Stats ==
/// Tracks which tier satisfied each opaque-ID resolution.
#[derive(Debug, Default)]
pub struct ResolveStats {
    /// Satisfied from an in-memory slot (resolved or joined in flight)
    memory_hits: AtomicU64,
    /// Satisfied from a non-expired persisted entry
    store_hits: AtomicU64,
    /// Remote lookups issued
    remote_fetches: AtomicU64,
    /// Resolutions that settled to no URL (unknown ID or lookup failure)
    misses: AtomicU64,
}

impl ResolveStats {
    /// Creates new stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_hit(&self) {
        self.store_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_fetch(&self) {
        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> ResolveStatsSnapshot {
        ResolveStatsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            store_hits: self.store_hits.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of the counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveStatsSnapshot {
    pub memory_hits: u64,
    pub store_hits: u64,
    pub remote_fetches: u64,
    pub misses: u64,
}
