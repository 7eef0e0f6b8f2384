//! Forecast record and bundle models

use super::Region;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One persisted forecast snapshot: a region's expected weather for a single
/// calendar date.
///
/// `(area_code, forecast_date)` is the unique key; a later write for the same
/// key fully replaces the earlier one. Temperatures are genuinely optional:
/// the remote source reports them for only part of the forecast window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForecastRecord {
    /// Region code this record belongs to
    pub area_code: String,
    /// Region display name as it was at ingest time
    pub area_name: String,
    /// Calendar date the forecast applies to (offset applied, time discarded)
    pub forecast_date: NaiveDate,
    /// Opaque vendor weather code; unrecognized values round-trip unchanged
    pub weather_code: String,
    /// Minimum temperature in °C, when the source reported one
    pub temp_min: Option<i64>,
    /// Maximum temperature in °C, when the source reported one
    pub temp_max: Option<i64>,
    /// When the store last wrote this record
    pub ingested_at: DateTime<Utc>,
}

impl ForecastRecord {
    /// Whether another record addresses the same `(area_code, forecast_date)` key
    #[must_use]
    pub fn same_key(&self, other: &ForecastRecord) -> bool {
        self.area_code == other.area_code && self.forecast_date == other.forecast_date
    }
}

/// The set of records derived from one fetch, ordered by forecast date
/// ascending as received from the source. Ephemeral: used to render the live
/// view without a store round-trip, never persisted as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastBundle {
    /// Region this bundle was fetched for
    pub region: Region,
    /// Flat dated records, forecast date ascending
    pub records: Vec<ForecastRecord>,
    /// When the fetch completed
    pub retrieved_at: DateTime<Utc>,
}

impl ForecastBundle {
    #[must_use]
    pub fn new(region: Region, records: Vec<ForecastRecord>) -> Self {
        Self {
            region,
            records,
            retrieved_at: Utc::now(),
        }
    }

    /// First record of the bundle (the nearest forecast date)
    #[must_use]
    pub fn current(&self) -> Option<&ForecastRecord> {
        self.records.first()
    }

    /// Record for a specific calendar date, if the fetch covered it
    #[must_use]
    pub fn record_for(&self, date: NaiveDate) -> Option<&ForecastRecord> {
        self.records.iter().find(|r| r.forecast_date == date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
