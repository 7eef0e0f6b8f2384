//! HTTP client and wire types for the JMA open-data endpoints
//!
//! Two endpoints are consumed: the area directory (region codes and names)
//! and the per-region forecast payload. Retry policy belongs to the caller;
//! this client makes exactly one attempt per call with a configured timeout.

use crate::config::SourceConfig;
use crate::error::TenkiError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Source of the region metadata directory
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the full region directory.
    ///
    /// Fails with `SourceUnavailable` on transport errors and
    /// `MalformedMetadata` when the response is not the expected document.
    async fn fetch_directory(&self) -> Result<AreaDirectory>;
}

/// Source of raw per-region forecast payloads
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the raw forecast payload for one region.
    ///
    /// Fails with `FetchFailed` on transport errors or timeouts and
    /// `MalformedPayload` when the response is not the expected document.
    async fn fetch_forecast(&self, area_code: &str) -> Result<ForecastPayload>;
}

/// Region directory as served by the metadata endpoint.
///
/// The document carries several collections; only the forecast offices are
/// used here. `offices` stays optional so a structurally wrong response can
/// be distinguished from an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaDirectory {
    /// Forecast offices keyed by region code
    #[serde(default)]
    pub offices: Option<HashMap<String, AreaEntry>>,
}

/// One entry of the region directory
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaEntry {
    /// Display name; entries without one are skipped during load
    #[serde(default)]
    pub name: Option<String>,
}

/// Raw forecast payload: an ordered list of report sections (short-range
/// first, then the weekly outlook), each carrying parallel time series.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ForecastPayload {
    pub sections: Vec<ForecastSection>,
}

/// One report section of the payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastSection {
    #[serde(rename = "timeSeries", default)]
    pub time_series: Vec<TimeSeries>,
}

/// A block of values aligned by index over a shared list of date markers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeries {
    /// RFC 3339 date markers with the source's local offset
    #[serde(rename = "timeDefines", default)]
    pub time_defines: Vec<String>,
    #[serde(default)]
    pub areas: Vec<AreaSeries>,
}

/// Per-area value lists, parallel to the series' date markers.
///
/// Temperature lists may be shorter than the date list and use "--" for
/// values the source does not know.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaSeries {
    #[serde(rename = "weatherCodes", default)]
    pub weather_codes: Vec<String>,
    #[serde(rename = "tempsMin", default)]
    pub temps_min: Vec<String>,
    #[serde(rename = "tempsMax", default)]
    pub temps_max: Vec<String>,
}

/// HTTP client for both JMA endpoints
pub struct JmaClient {
    client: Client,
    area_url: String,
    forecast_base_url: String,
}

impl JmaClient {
    /// Create a new client with the configured timeout
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("tenki/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TenkiError::source_unavailable(e.to_string()))?;

        Ok(Self {
            client,
            area_url: config.area_url.clone(),
            forecast_base_url: config.forecast_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataSource for JmaClient {
    #[instrument(skip(self))]
    async fn fetch_directory(&self) -> Result<AreaDirectory> {
        debug!(url = %self.area_url, "fetching region directory");

        let response = self
            .client
            .get(&self.area_url)
            .send()
            .await
            .map_err(|e| TenkiError::source_unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TenkiError::source_unavailable(format!(
                "metadata endpoint returned HTTP {status}"
            )));
        }

        let directory: AreaDirectory = response
            .json()
            .await
            .map_err(|e| TenkiError::malformed_metadata(e.to_string()))?;

        info!("region directory fetched");
        Ok(directory)
    }
}

#[async_trait]
impl ForecastSource for JmaClient {
    #[instrument(skip(self))]
    async fn fetch_forecast(&self, area_code: &str) -> Result<ForecastPayload> {
        let url = format!("{}/{}.json", self.forecast_base_url, area_code);
        debug!(url = %url, "fetching forecast payload");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TenkiError::fetch_failed(area_code, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TenkiError::fetch_failed(
                area_code,
                format!("forecast endpoint returned HTTP {status}"),
            ));
        }

        let payload: ForecastPayload = response
            .json()
            .await
            .map_err(|e| TenkiError::malformed_payload(e.to_string()))?;

        info!(sections = payload.sections.len(), "forecast payload fetched");
        Ok(payload)
    }
}
