//! Registry counters
//!
//! Lightweight operational counters for the connection registry, updated with
//! relaxed atomics from whatever task happens to be holding the registry.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by the registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Connections ever registered
    pub total_connections: AtomicU64,
    /// Broadcast calls issued
    pub broadcasts: AtomicU64,
    /// Payloads successfully enqueued to a connection
    pub payloads_enqueued: AtomicU64,
    /// Connections dropped after a send failure
    pub connections_dropped: AtomicU64,
}

impl RegistryStats {
    /// Create a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            payloads_enqueued: self.payloads_enqueued.load(Ordering::Relaxed),
            connections_dropped: self.connections_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the registry counters at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections ever registered
    pub total_connections: u64,
    /// Broadcast calls issued
    pub broadcasts: u64,
    /// Payloads successfully enqueued to a connection
    pub payloads_enqueued: u64,
    /// Connections dropped after a send failure
    pub connections_dropped: u64,
}
