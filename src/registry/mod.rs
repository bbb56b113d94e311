//! Connection registry for live push fan-out
//!
//! The registry owns the authoritative set of open push connections and
//! delivers each ingested reading to all of them, best-effort.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ConnectionRegistry>
//!                  ┌───────────────────────────────┐
//!                  │ connections: HashMap<Id,      │
//!                  │   ConnectionEntry {           │
//!                  │     state,                    │
//!                  │     tx: mpsc::Sender<Bytes>,  │
//!                  │   }                           │
//!                  │ >                             │
//!                  └──────────────┬────────────────┘
//!                                 │
//!          ┌──────────────────────┼──────────────────────┐
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//!     [Ingestion]            [Viewer]               [Viewer]
//!     broadcast()            write task             write task
//!          │                 queue.recv()           queue.recv()
//!          └──► try_send() ──► bounded queue ──► WebSocket frame
//! ```
//!
//! Each connection gets its own bounded queue, so broadcast is a
//! non-blocking enqueue per connection: one slow or dead viewer can never
//! delay delivery to the rest. A connection whose queue is full (or whose
//! write task is gone) is marked `Closing` during the pass and removed in a
//! sweep afterwards, never mid-traversal.
//!
//! # Zero-Copy Design
//!
//! `bytes::Bytes` uses reference counting, so every connection's queue
//! shares the same payload allocation. The per-connection clone only bumps a
//! refcount.

pub mod config;
pub mod entry;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{ConnectionEntry, ConnectionId, ConnectionState};
pub use store::ConnectionRegistry;
