//! SQLite-backed reading store
//!
//! Single `rusqlite` connection behind a mutex; every query runs on the
//! blocking thread pool so storage I/O never stalls the async runtime.
//! Timestamps are stored as RFC 3339 UTC text, which keeps `ORDER BY` on the
//! column chronologically correct.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::reading::{NewReading, Reading};

use super::{ReadingStore, StoreError};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS readings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    temperature_c REAL NOT NULL,
    humidity      REAL NOT NULL,
    reading_date  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_readings_date ON readings (reading_date DESC);
";

/// Durable reading store backed by SQLite
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()).map_err(StoreError::from))
            .await
            .map_err(|_| StoreError::TaskJoin)?
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn save(&self, reading: NewReading) -> Result<Reading, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO readings (temperature_c, humidity, reading_date) \
                 VALUES (?1, ?2, ?3)",
                params![reading.temperature_c, reading.humidity, reading.timestamp],
            )?;

            Ok(Reading {
                id: conn.last_insert_rowid(),
                temperature_c: reading.temperature_c,
                humidity: reading.humidity,
                timestamp: reading.timestamp,
            })
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Reading>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, temperature_c, humidity, reading_date FROM readings \
                 ORDER BY reading_date DESC, id DESC",
            )?;

            let rows = stmt.query_map([], |row| {
                Ok(Reading {
                    id: row.get(0)?,
                    temperature_c: row.get(1)?,
                    humidity: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })?;

            rows.collect()
        })
        .await
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM readings", [])?;
            Ok(deleted as u64)
        })
        .await
    }
}
