//! Ingestion pipeline
//!
//! One accepted reading travels: validate → persist → broadcast. The
//! persist-then-broadcast order is an invariant — a reading is never pushed
//! to viewers unless the history endpoint can later confirm it.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::reading::{InvalidReading, RawReading, Reading};
use crate::registry::ConnectionRegistry;
use crate::store::{ReadingStore, StoreError};

/// Why a submission was rejected
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed or missing reading fields; nothing was persisted
    #[error("invalid reading: {0}")]
    InvalidInput(#[from] InvalidReading),

    /// Persistence failed; nothing was broadcast
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Accepts readings, persists them, and publishes them to live viewers
pub struct IngestionPipeline<S> {
    store: Arc<S>,
    registry: Arc<ConnectionRegistry>,
}

impl<S: ReadingStore> IngestionPipeline<S> {
    /// Create a pipeline over a store and a registry
    pub fn new(store: Arc<S>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Validate, persist, then publish one reading.
    ///
    /// The submitter observes persistence only: broadcast is fire-and-forget
    /// and its failures never surface here.
    pub async fn submit(&self, raw: RawReading) -> Result<Reading, IngestError> {
        let reading = self.store.save(raw.validate()?).await?;

        match serde_json::to_vec(&reading) {
            Ok(json) => {
                let delivered = self.registry.broadcast(Bytes::from(json)).await;
                tracing::debug!(id = reading.id, delivered, "Reading broadcast");
            }
            Err(e) => {
                // Cannot happen for a well-formed Reading, but a broadcast
                // problem must not fail the submission
                tracing::error!(id = reading.id, error = %e, "Reading serialization failed");
            }
        }

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use crate::reading::NewReading;
    use crate::store::MemoryStore;

    use super::*;

    /// Store whose saves always fail
    struct FailingStore;

    #[async_trait]
    impl ReadingStore for FailingStore {
        async fn save(&self, _reading: NewReading) -> Result<Reading, StoreError> {
            Err(StoreError::TaskJoin)
        }

        async fn list_all(&self) -> Result<Vec<Reading>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete_all(&self) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    fn pipeline_with_memory() -> (IngestionPipeline<MemoryStore>, Arc<MemoryStore>, Arc<ConnectionRegistry>)
    {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let pipeline = IngestionPipeline::new(Arc::clone(&store), Arc::clone(&registry));
        (pipeline, store, registry)
    }

    fn valid_raw() -> RawReading {
        RawReading {
            temperature_c: Some(85.0),
            humidity: Some(40.0),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_submit_persists_and_broadcasts_same_reading() {
        let (pipeline, _store, registry) = pipeline_with_memory();
        let (_id, mut rx) = registry.register().await;

        let reading = pipeline.submit(valid_raw()).await.unwrap();

        let payload = rx.recv().await.unwrap();
        let wire: Reading = serde_json::from_slice(&payload).unwrap();

        assert_eq!(wire, reading);
        assert_eq!(wire.temperature_c, 85.0);
        assert_eq!(wire.humidity, 40.0);
        assert_eq!(wire.id, reading.id);
    }

    #[tokio::test]
    async fn test_submit_assigns_id_and_server_timestamp() {
        let (pipeline, store, _registry) = pipeline_with_memory();

        let before = Utc::now();
        let reading = pipeline.submit(valid_raw()).await.unwrap();

        assert_eq!(reading.id, 1);
        assert!(reading.timestamp >= before);
        assert_eq!(store.list_all().await.unwrap(), vec![reading]);
    }

    #[tokio::test]
    async fn test_invalid_input_leaves_store_untouched() {
        let (pipeline, store, registry) = pipeline_with_memory();
        let (_id, mut rx) = registry.register().await;

        let result = pipeline
            .submit(RawReading {
                temperature_c: Some(f64::NAN),
                humidity: Some(40.0),
                timestamp: None,
            })
            .await;

        assert!(matches!(result, Err(IngestError::InvalidInput(_))));
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_storage_failure_skips_broadcast() {
        let registry = Arc::new(ConnectionRegistry::new());
        let pipeline = IngestionPipeline::new(Arc::new(FailingStore), Arc::clone(&registry));
        let (_id, mut rx) = registry.register().await;

        let result = pipeline.submit(valid_raw()).await;

        assert!(matches!(result, Err(IngestError::Storage(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_without_viewers_still_succeeds() {
        let (pipeline, _store, _registry) = pipeline_with_memory();

        assert!(pipeline.submit(valid_raw()).await.is_ok());
    }

    #[tokio::test]
    async fn test_sequential_submissions_broadcast_in_persist_order() {
        let (pipeline, _store, registry) = pipeline_with_memory();
        let (_id, mut rx) = registry.register().await;

        let ts = |hour| Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
        for hour in 1..=3 {
            pipeline
                .submit(RawReading {
                    temperature_c: Some(hour as f64),
                    humidity: Some(40.0),
                    timestamp: Some(ts(hour)),
                })
                .await
                .unwrap();
        }

        for hour in 1..=3 {
            let wire: Reading = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(wire.timestamp, ts(hour));
        }
    }
}
