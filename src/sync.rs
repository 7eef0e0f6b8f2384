//! Sync orchestrator: drives fetch → normalize → persist for a region and
//! serves the merged live + historical views
//!
//! Overlapping syncs for the same region are serialized behind a per-region
//! lock so two upserts for the same key never race. Queries run lock-free
//! against the store and may observe a partially synced batch; no
//! cross-record transaction is promised.

use crate::directory::RegionDirectory;
use crate::error::TenkiError;
use crate::jma::ForecastSource;
use crate::models::{ForecastBundle, ForecastRecord, Region};
use crate::normalize::normalize;
use crate::store::{ForecastStore, HistoryFilter};
use crate::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Stages a region sync moves through, surfaced in structured logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Normalizing,
    Persisting,
    Ready,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Normalizing => "normalizing",
            SyncPhase::Persisting => "persisting",
            SyncPhase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Core API surface exposed to the presentation layer
pub struct SyncOrchestrator {
    directory: Arc<RegionDirectory>,
    source: Arc<dyn ForecastSource>,
    store: ForecastStore,
    region_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(
        directory: Arc<RegionDirectory>,
        source: Arc<dyn ForecastSource>,
        store: ForecastStore,
    ) -> Self {
        Self {
            directory,
            source,
            store,
            region_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load (or reload) the region directory and return it sorted by code
    pub async fn load_regions(&self) -> Result<Vec<Region>> {
        self.directory.load().await?;
        Ok(self.directory.regions().await)
    }

    /// Fetch, normalize, and persist the forecast for one region, returning
    /// the bundle built directly from the normalized records.
    ///
    /// Every record is upserted before the bundle is returned, so the live
    /// view and the persisted history never diverge. If some upserts fail
    /// the already-fetched bundle is still delivered, wrapped in
    /// `SyncPartiallyFailed`: a display failure is worse than a cache-write
    /// failure.
    #[instrument(skip(self))]
    pub async fn sync_and_load(&self, area_code: &str) -> Result<ForecastBundle> {
        let region = self.directory.resolve(area_code).await?;

        let lock = self.region_lock(area_code).await;
        let _guard = lock.lock().await;

        debug!(phase = %SyncPhase::Fetching, region = %region);
        let payload = self.source.fetch_forecast(area_code).await?;

        debug!(phase = %SyncPhase::Normalizing);
        let records = normalize(&region.code, &region.name, &payload)?;

        debug!(phase = %SyncPhase::Persisting, records = records.len());
        let mut failed = 0usize;
        for record in &records {
            if let Err(err) = self.store.upsert(record).await {
                failed += 1;
                warn!(
                    date = %record.forecast_date,
                    error = %err,
                    "failed to persist forecast record"
                );
            }
        }

        let bundle = ForecastBundle::new(region, records);
        if failed > 0 {
            return Err(TenkiError::SyncPartiallyFailed {
                bundle: Box::new(bundle),
                failed,
            });
        }

        info!(phase = %SyncPhase::Ready, records = bundle.len(), "region synced");
        Ok(bundle)
    }

    /// Persisted history matching the filter, forecast date descending
    pub async fn get_history(&self, filter: &HistoryFilter) -> Result<Vec<ForecastRecord>> {
        self.store.query_range(filter).await
    }

    /// Persisted snapshot for one region and date, if any
    pub async fn get_snapshot(
        &self,
        area_code: &str,
        date: NaiveDate,
    ) -> Result<Option<ForecastRecord>> {
        self.store.query_by_date(area_code, date).await
    }

    async fn region_lock(&self, area_code: &str) -> Arc<Mutex<()>> {
        self.region_locks
            .lock()
            .await
            .entry(area_code.to_string())
            .or_default()
            .clone()
    }
}
