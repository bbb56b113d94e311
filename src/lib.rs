//! # thermocast-rs
//!
//! Sensor telemetry server: HTTP ingestion of temperature/humidity readings
//! with live WebSocket fan-out to connected viewers.
//!
//! # Architecture
//!
//! ```text
//!   sensor ──POST /measurements──► IngestionPipeline
//!                                       │ validate
//!                                       │ store.save()        (durable first)
//!                                       ▼
//!                                ConnectionRegistry.broadcast(json)
//!                                  │           │           │
//!                                  ▼           ▼           ▼
//!                              [viewer]    [viewer]    [viewer]
//!                              GET /ws     GET /ws     GET /ws
//! ```
//!
//! A reading is only broadcast after it has been persisted, so the live feed
//! never shows data the history endpoint (`GET /measurements`) cannot
//! confirm. Broadcast is best-effort: slow or dead viewers are disconnected,
//! never buffered unboundedly, and their failures never reach the sensor.
//!
//! # Quick start
//!
//! ```no_run
//! use thermocast_rs::store::SqliteStore;
//! use thermocast_rs::{SensorServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> thermocast_rs::Result<()> {
//!     let config = ServerConfig::default();
//!     let store = SqliteStore::open(&config.db_path)?;
//!     SensorServer::new(config, store).run().await
//! }
//! ```

pub mod error;
pub mod ingest;
pub mod reading;
pub mod registry;
pub mod server;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use ingest::{IngestError, IngestionPipeline};
pub use reading::{InvalidReading, NewReading, RawReading, Reading};
pub use registry::{ConnectionId, ConnectionRegistry, RegistryConfig};
pub use server::{SensorServer, ServerConfig};
