//! Sensor reading data model
//!
//! A reading moves through three shapes on its way into the system:
//!
//! ```text
//!    RawReading  ──validate()──►  NewReading  ──store.save()──►  Reading
//!    (wire input)                 (normalized)                   (persisted)
//! ```
//!
//! `RawReading` is whatever the client sent; `NewReading` has passed
//! validation and carries a timestamp (server-assigned when the client sent
//! none); `Reading` additionally carries the store-assigned id and is
//! immutable from then on.
//!
//! Timestamps are UTC everywhere. Localization is a client concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for an incoming reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReading {
    /// Temperature field absent
    #[error("temperature is missing")]
    MissingTemperature,
    /// Humidity field absent
    #[error("humidity is missing")]
    MissingHumidity,
    /// A numeric field is NaN or infinite
    #[error("{field} is not a finite number")]
    NonFinite {
        /// Which field failed
        field: &'static str,
    },
}

/// An incoming reading exactly as the client sent it
///
/// All fields are optional at this stage; `validate` decides what is
/// acceptable. Wire field names are camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    /// Temperature in degrees Celsius
    pub temperature_c: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Measurement time; server time is assigned when absent
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawReading {
    /// Validate and normalize into a reading ready for persistence.
    ///
    /// Temperature and humidity must be present and finite. A missing
    /// timestamp is filled in with the current server time.
    pub fn validate(self) -> Result<NewReading, InvalidReading> {
        let temperature_c = self
            .temperature_c
            .ok_or(InvalidReading::MissingTemperature)?;
        let humidity = self.humidity.ok_or(InvalidReading::MissingHumidity)?;

        if !temperature_c.is_finite() {
            return Err(InvalidReading::NonFinite {
                field: "temperature",
            });
        }
        if !humidity.is_finite() {
            return Err(InvalidReading::NonFinite { field: "humidity" });
        }

        Ok(NewReading {
            temperature_c,
            humidity,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// A validated reading awaiting persistence
///
/// Only produced by [`RawReading::validate`], so the invariants (finite
/// numbers, timestamp always set) hold by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    /// Temperature in degrees Celsius
    pub temperature_c: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Measurement time (UTC)
    pub timestamp: DateTime<Utc>,
}

/// A persisted reading
///
/// Serializes to the flat wire object used by both the history endpoint and
/// the live broadcast:
/// `{"id": 1, "temperatureC": 85.0, "humidity": 40.0, "timestamp": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Store-assigned identifier, unique per reading
    pub id: i64,
    /// Temperature in degrees Celsius
    pub temperature_c: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Measurement time (UTC)
    pub timestamp: DateTime<Utc>,
}
