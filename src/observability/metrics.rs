//! Routing counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics; a registry can be shared by concurrent resolvers

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters describing routing outcomes
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    resolutions: AtomicU64,
    narrowed: AtomicU64,
    full_scans: AtomicU64,
    failures: AtomicU64,
    opaque_nodes: AtomicU64,
    depth_limit_hits: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed resolution
    pub fn record_resolution(&self, full_scan: bool) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if full_scan {
            self.full_scans.fetch_add(1, Ordering::Relaxed);
        } else {
            self.narrowed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a resolution aborted by a literal failure
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a node that could not narrow anything
    pub fn record_opaque(&self) {
        self.opaque_nodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_depth_limit(&self) {
        self.depth_limit_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            narrowed: self.narrowed.load(Ordering::Relaxed),
            full_scans: self.full_scans.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            opaque_nodes: self.opaque_nodes.load(Ordering::Relaxed),
            depth_limit_hits: self.depth_limit_hits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub resolutions: u64,
    pub narrowed: u64,
    pub full_scans: u64,
    pub failures: u64,
    pub opaque_nodes: u64,
    pub depth_limit_hits: u64,
}
