//! Crate-level error type
//!
//! Fine-grained errors live next to the component that produces them
//! ([`InvalidReading`](crate::reading::InvalidReading),
//! [`StoreError`](crate::store::StoreError),
//! [`IngestError`](crate::ingest::IngestError)); this is the coarse type
//! returned by the server entry points.

use thiserror::Error;

use crate::store::StoreError;

/// Top-level server error
#[derive(Debug, Error)]
pub enum Error {
    /// Socket bind/accept or other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
