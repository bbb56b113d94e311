//! Reading persistence
//!
//! The ingestion pipeline only depends on the [`ReadingStore`] trait; the
//! backends here are interchangeable. [`SqliteStore`] is the durable default,
//! [`MemoryStore`] backs tests and zero-setup development.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::reading::{NewReading, Reading};

/// Persistence failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The blocking storage task was cancelled or panicked
    #[error("storage task failed to complete")]
    TaskJoin,
}

/// Storage contract for sensor readings
///
/// `save` must be durable before returning and must assign a unique id;
/// those two guarantees are all the ingestion pipeline relies on.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist a reading, assigning its id
    async fn save(&self, reading: NewReading) -> Result<Reading, StoreError>;

    /// All readings, newest first
    async fn list_all(&self) -> Result<Vec<Reading>, StoreError>;

    /// Remove every reading, returning how many were deleted
    async fn delete_all(&self) -> Result<u64, StoreError>;
}
