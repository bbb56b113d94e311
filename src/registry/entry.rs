//! Connection entry and state types
//!
//! This module defines the per-connection state stored in the registry.

use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;

/// Unique identifier for a push connection
///
/// Assigned by the registry at registration time, monotonically increasing
/// for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(super) u64);

impl ConnectionId {
    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Liveness state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Eligible for broadcast
    Open,
    /// A send failed; removal is scheduled
    Closing,
    /// Removed from the registry
    Closed,
}

/// Why a payload could not be enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SendFailure {
    /// The outbound queue is full (slow consumer)
    Backlogged,
    /// The receiving side is gone (write task died)
    Gone,
}

/// Entry for a single connection in the registry
pub struct ConnectionEntry {
    /// Connection identifier
    pub id: ConnectionId,

    /// Sender half of the connection's outbound payload queue
    tx: mpsc::Sender<Bytes>,

    /// Current liveness state
    pub state: ConnectionState,

    /// When the connection was registered
    pub connected_at: Instant,

    /// Payloads enqueued to this connection so far
    pub enqueued: u64,
}

impl ConnectionEntry {
    pub(super) fn new(id: ConnectionId, tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            tx,
            state: ConnectionState::Open,
            connected_at: Instant::now(),
            enqueued: 0,
        }
    }

    /// Whether the connection is eligible for broadcast
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Time since registration
    pub fn uptime(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Enqueue a payload without blocking.
    ///
    /// `Bytes` is reference counted, so the clone handed to the queue shares
    /// the broadcast payload's allocation.
    pub(super) fn try_send(&mut self, payload: Bytes) -> Result<(), SendFailure> {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.enqueued += 1;
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(SendFailure::Backlogged),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendFailure::Gone),
        }
    }
}
