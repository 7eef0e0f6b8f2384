//! SQLite-backed forecast history store
//!
//! One table, `forecasts`, keyed by `(area_code, forecast_date)`. Writes are
//! idempotent last-write-wins upserts; reads are a point lookup and a
//! filtered range scan. Every operation is atomic at single-record
//! granularity, nothing more is promised across records.

use crate::error::TenkiError;
use crate::models::ForecastRecord;
use crate::Result;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS forecasts (
    area_code TEXT NOT NULL,
    area_name TEXT NOT NULL,
    forecast_date DATE NOT NULL,
    weather_code TEXT NOT NULL,
    temp_min INTEGER,
    temp_max INTEGER,
    ingested_at TIMESTAMP NOT NULL,
    UNIQUE(area_code, forecast_date)
)
"#;

const RECORD_COLUMNS: &str =
    "area_code, area_name, forecast_date, weather_code, temp_min, temp_max, ingested_at";

/// Optional filters for a history query; omitting all of them returns the
/// full store.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Restrict to one region
    pub area_code: Option<String>,
    /// Earliest forecast date, inclusive
    pub start: Option<NaiveDate>,
    /// Latest forecast date, inclusive
    pub end: Option<NaiveDate>,
}

impl HistoryFilter {
    /// Filter down to a single region
    #[must_use]
    pub fn for_area(area_code: impl Into<String>) -> Self {
        Self {
            area_code: Some(area_code.into()),
            ..Self::default()
        }
    }
}

/// Persistent keyed store for forecast records
#[derive(Clone)]
pub struct ForecastStore {
    pool: Pool<Sqlite>,
}

impl ForecastStore {
    /// Open (creating if necessary) the store at the given path
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| TenkiError::StorageWriteFailed { source: e })?;

        info!(path = %path.as_ref().display(), "forecast store opened");
        Self::with_pool(pool).await
    }

    /// Build a store on an existing pool, creating the schema if needed
    pub async fn with_pool(pool: Pool<Sqlite>) -> Result<Self> {
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| TenkiError::StorageWriteFailed { source: e })?;
        Ok(Self { pool })
    }

    /// Insert or fully replace the record stored under the record's
    /// `(area_code, forecast_date)` key. `ingested_at` is refreshed on every
    /// write regardless of what the record carries.
    pub async fn upsert(&self, record: &ForecastRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO forecasts
                (area_code, area_name, forecast_date, weather_code, temp_min, temp_max, ingested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(area_code, forecast_date) DO UPDATE SET
                area_name = excluded.area_name,
                weather_code = excluded.weather_code,
                temp_min = excluded.temp_min,
                temp_max = excluded.temp_max,
                ingested_at = excluded.ingested_at
            "#,
        )
        .bind(&record.area_code)
        .bind(&record.area_name)
        .bind(record.forecast_date)
        .bind(&record.weather_code)
        .bind(record.temp_min)
        .bind(record.temp_max)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| TenkiError::StorageWriteFailed { source: e })?;

        debug!(
            area_code = %record.area_code,
            date = %record.forecast_date,
            "forecast record upserted"
        );
        Ok(())
    }

    /// Exact key lookup; a missing record is `Ok(None)`, not an error
    pub async fn query_by_date(
        &self,
        area_code: &str,
        date: NaiveDate,
    ) -> Result<Option<ForecastRecord>> {
        let sql =
            format!("SELECT {RECORD_COLUMNS} FROM forecasts WHERE area_code = ? AND forecast_date = ?");

        sqlx::query_as::<_, ForecastRecord>(&sql)
            .bind(area_code)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TenkiError::StorageReadFailed { source: e })
    }

    /// Filtered range scan, ordered by forecast date descending
    pub async fn query_range(&self, filter: &HistoryFilter) -> Result<Vec<ForecastRecord>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM forecasts WHERE 1=1");
        if filter.area_code.is_some() {
            sql.push_str(" AND area_code = ?");
        }
        if filter.start.is_some() {
            sql.push_str(" AND forecast_date >= ?");
        }
        if filter.end.is_some() {
            sql.push_str(" AND forecast_date <= ?");
        }
        sql.push_str(" ORDER BY forecast_date DESC");

        let mut query = sqlx::query_as::<_, ForecastRecord>(&sql);
        if let Some(area_code) = &filter.area_code {
            query = query.bind(area_code);
        }
        if let Some(start) = filter.start {
            query = query.bind(start);
        }
        if let Some(end) = filter.end {
            query = query.bind(end);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TenkiError::StorageReadFailed { source: e })
    }

    /// Underlying pool, for callers that manage shutdown themselves
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
