//! `tenki` - forecast cache and synchronization layer for JMA regional
//! forecasts
//!
//! This library fetches region metadata and weekly forecasts, normalizes the
//! nested time-series payloads into flat dated records, persists them with
//! `(area_code, forecast_date)` deduplication, and answers point-in-time and
//! range queries against the persisted history.

pub mod config;
pub mod directory;
pub mod error;
pub mod jma;
pub mod models;
pub mod normalize;
pub mod store;
pub mod sync;

// Re-export core types for public API
pub use config::TenkiConfig;
pub use directory::RegionDirectory;
pub use error::TenkiError;
pub use jma::{ForecastSource, JmaClient, MetadataSource};
pub use models::{ForecastBundle, ForecastRecord, Region};
pub use store::{ForecastStore, HistoryFilter};
pub use sync::{SyncOrchestrator, SyncPhase};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TenkiError>;
