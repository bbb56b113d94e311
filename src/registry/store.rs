//! Connection registry implementation
//!
//! The central registry that owns the set of live push connections and
//! delivers broadcast payloads to each of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use crate::stats::RegistryStats;

use super::config::RegistryConfig;
use super::entry::{ConnectionEntry, ConnectionId, ConnectionState, SendFailure};

/// Central registry for all live push connections
///
/// Thread-safe via `RwLock`. Broadcast takes a snapshot under the read lock
/// and never mutates the map while traversing it; failed connections are
/// marked `Closing` during the pass and removed in one sweep afterwards.
pub struct ConnectionRegistry {
    /// Map of connection id to connection entry
    connections: RwLock<HashMap<ConnectionId, Arc<RwLock<ConnectionEntry>>>>,

    /// Next connection id to assign
    next_id: AtomicU64,

    /// Configuration
    config: RegistryConfig,

    /// Operational counters
    stats: RegistryStats,
}

impl ConnectionRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
            stats: RegistryStats::new(),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the registry counters
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Register a newly-established connection.
    ///
    /// Creates the connection's bounded outbound queue and returns its id
    /// together with the receiver half, which the connection's write task
    /// drains. The connection is eligible for broadcast as soon as this
    /// returns.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<Bytes>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);

        let entry = ConnectionEntry::new(id, tx);
        self.connections
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(entry)));

        self.stats.total_connections.fetch_add(1, Ordering::Relaxed);
        tracing::info!(connection = %id, "Viewer connected");

        (id, rx)
    }

    /// Unregister a connection.
    ///
    /// Idempotent: unregistering an id that was already removed is a no-op.
    /// Dropping the entry drops the queue sender, which lets the connection's
    /// write task drain outstanding payloads and close the socket.
    pub async fn unregister(&self, id: ConnectionId) {
        let removed = self.connections.write().await.remove(&id);

        if let Some(entry_arc) = removed {
            let mut entry = entry_arc.write().await;
            entry.state = ConnectionState::Closed;

            tracing::info!(
                connection = %id,
                enqueued = entry.enqueued,
                uptime_secs = entry.uptime().as_secs(),
                "Viewer disconnected"
            );
        }
    }

    /// Broadcast a payload to every open connection, best-effort.
    ///
    /// Per connection: one non-blocking enqueue attempt. A full queue or a
    /// dead receiver marks the connection `Closing`; all `Closing`
    /// connections are removed after the pass. Never blocks on a slow
    /// consumer and never reports an error to the caller.
    ///
    /// Returns the number of connections the payload was enqueued to.
    pub async fn broadcast(&self, payload: Bytes) -> usize {
        self.stats.broadcasts.fetch_add(1, Ordering::Relaxed);

        // Snapshot under the read lock; the map itself is not touched while
        // iterating, so concurrent register/unregister stay consistent.
        let snapshot: Vec<(ConnectionId, Arc<RwLock<ConnectionEntry>>)> = {
            let connections = self.connections.read().await;
            connections
                .iter()
                .map(|(id, entry)| (*id, Arc::clone(entry)))
                .collect()
        };

        let mut delivered = 0;
        let mut failed = Vec::new();

        for (id, entry_arc) in snapshot {
            let mut entry = entry_arc.write().await;

            // Raced with unregister or an earlier failure
            if !entry.is_open() {
                continue;
            }

            match entry.try_send(payload.clone()) {
                Ok(()) => {
                    delivered += 1;
                }
                Err(reason) => {
                    entry.state = ConnectionState::Closing;
                    failed.push((id, reason));
                }
            }
        }

        self.stats
            .payloads_enqueued
            .fetch_add(delivered as u64, Ordering::Relaxed);

        if !failed.is_empty() {
            self.sweep_failed(&failed).await;
        }

        delivered
    }

    /// Remove connections that failed during a broadcast pass
    async fn sweep_failed(&self, failed: &[(ConnectionId, SendFailure)]) {
        let mut connections = self.connections.write().await;

        for (id, reason) in failed {
            if let Some(entry_arc) = connections.remove(id) {
                let mut entry = entry_arc.write().await;
                entry.state = ConnectionState::Closed;

                self.stats
                    .connections_dropped
                    .fetch_add(1, Ordering::Relaxed);

                match reason {
                    SendFailure::Backlogged => {
                        tracing::warn!(
                            connection = %id,
                            enqueued = entry.enqueued,
                            "Viewer dropped: outbound queue full"
                        );
                    }
                    SendFailure::Gone => {
                        tracing::debug!(connection = %id, "Viewer dropped: write task gone");
                    }
                }
            }
        }
    }

    /// Close every connection, draining the registry.
    ///
    /// Used at shutdown. Dropping the queue senders lets each write task
    /// flush in-flight payloads (or time out) and perform the close
    /// handshake.
    pub async fn close_all(&self) {
        let mut connections = self.connections.write().await;

        for (id, entry_arc) in connections.drain() {
            let mut entry = entry_arc.write().await;
            entry.state = ConnectionState::Closed;
            tracing::debug!(connection = %id, "Connection closed at shutdown");
        }
    }

    /// Number of currently-registered connections
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_register_then_broadcast() {
        let registry = ConnectionRegistry::new();
        let (_id, mut rx) = registry.register().await;

        let delivered = registry.broadcast(Bytes::from_static(b"payload")).await;

        assert_eq!(delivered, 1);
        assert_eq!(&rx.recv().await.unwrap()[..], b"payload");
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        let registry = ConnectionRegistry::new();

        // Must not error, just deliver to nobody
        assert_eq!(registry.broadcast(Bytes::from_static(b"x")).await, 0);
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let registry = ConnectionRegistry::new();
        let (id, mut rx) = registry.register().await;

        registry.unregister(id).await;

        assert_eq!(registry.broadcast(Bytes::from_static(b"x")).await, 0);
        // Sender was dropped with the entry
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = registry.register().await;

        registry.unregister(id).await;
        registry.unregister(id).await;

        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_dead_receiver_is_reaped_by_broadcast() {
        let registry = ConnectionRegistry::new();
        let (_id, rx) = registry.register().await;

        // Simulates the connection's write task dying
        drop(rx);

        assert_eq!(registry.broadcast(Bytes::from_static(b"x")).await, 0);
        assert_eq!(registry.connection_count().await, 0);
        assert_eq!(registry.stats().snapshot().connections_dropped, 1);
    }

    #[tokio::test]
    async fn test_slow_consumer_is_dropped_without_delaying_others() {
        let config = RegistryConfig::default().queue_capacity(1);
        let registry = ConnectionRegistry::with_config(config);

        let (_slow, _slow_rx) = registry.register().await; // never drained
        let (_fast, mut fast_rx) = registry.register().await;

        assert_eq!(registry.broadcast(Bytes::from_static(b"one")).await, 2);
        assert_eq!(&fast_rx.recv().await.unwrap()[..], b"one");

        // Slow viewer's queue is still full: it gets dropped, the fast
        // viewer still receives
        assert_eq!(registry.broadcast(Bytes::from_static(b"two")).await, 1);
        assert_eq!(&fast_rx.recv().await.unwrap()[..], b"two");

        assert_eq!(registry.connection_count().await, 1);
        assert_eq!(registry.stats().snapshot().connections_dropped, 1);
    }

    #[tokio::test]
    async fn test_close_all_drains_registry() {
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;

        registry.close_all().await;

        assert_eq!(registry.connection_count().await, 0);
        assert!(rx_a.recv().await.is_none());
        assert!(rx_b.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = registry.register().await;
        let (b, _rx_b) = registry.register().await;

        assert!(b > a);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_unregister_broadcast() {
        let registry = Arc::new(ConnectionRegistry::with_config(
            RegistryConfig::default().queue_capacity(1024),
        ));

        // Viewers that stay for the whole test
        let mut stable = Vec::new();
        for _ in 0..8 {
            stable.push(registry.register().await);
        }

        // Churn: register and immediately unregister, racing the broadcasts
        let churn: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    let (id, _rx) = registry.register().await;
                    tokio::task::yield_now().await;
                    registry.unregister(id).await;
                })
            })
            .collect();

        let broadcasters: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry.broadcast(Bytes::from(format!("m{i}"))).await
                })
            })
            .collect();

        for task in churn {
            task.await.unwrap();
        }
        for task in broadcasters {
            task.await.unwrap();
        }

        // Only the stable viewers remain, and a broadcast issued after all
        // registrations completed reaches every one of them
        assert_eq!(registry.connection_count().await, stable.len());
        let delivered = registry.broadcast(Bytes::from_static(b"final")).await;
        assert_eq!(delivered, stable.len());

        for (_id, rx) in &mut stable {
            loop {
                let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                    .await
                    .expect("viewer should receive the final broadcast")
                    .expect("queue closed unexpectedly");
                if &payload[..] == b"final" {
                    break;
                }
            }
        }
    }
}
