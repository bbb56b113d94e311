//! In-memory reading store
//!
//! Same contract as the SQLite backend, no durability. Used by tests and as
//! a zero-setup store for development.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::reading::{NewReading, Reading};

use super::{ReadingStore, StoreError};

/// Volatile reading store
#[derive(Debug)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            readings: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn save(&self, reading: NewReading) -> Result<Reading, StoreError> {
        let saved = Reading {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            temperature_c: reading.temperature_c,
            humidity: reading.humidity,
            timestamp: reading.timestamp,
        };

        self.readings.lock().push(saved.clone());
        Ok(saved)
    }

    async fn list_all(&self) -> Result<Vec<Reading>, StoreError> {
        let mut all = self.readings.lock().clone();
        all.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        Ok(all)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut readings = self.readings.lock();
        let deleted = readings.len() as u64;
        readings.clear();
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn new_reading(temperature_c: f64, hour: u32) -> NewReading {
        NewReading {
            temperature_c,
            humidity: 40.0,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_unique_ids() {
        let store = MemoryStore::new();

        let first = store.save(new_reading(20.0, 1)).await.unwrap();
        let second = store.save(new_reading(21.0, 2)).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() {
        let store = MemoryStore::new();

        store.save(new_reading(20.0, 1)).await.unwrap();
        store.save(new_reading(22.0, 3)).await.unwrap();
        store.save(new_reading(21.0, 2)).await.unwrap();

        let all = store.list_all().await.unwrap();
        let temps: Vec<f64> = all.iter().map(|r| r.temperature_c).collect();

        assert_eq!(temps, vec![22.0, 21.0, 20.0]);
    }

    #[tokio::test]
    async fn test_delete_all_returns_count_and_empties() {
        let store = MemoryStore::new();

        store.save(new_reading(20.0, 1)).await.unwrap();
        store.save(new_reading(21.0, 2)).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
