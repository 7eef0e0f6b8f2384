//! Core data model: regions, flat forecast records, and in-memory bundles

pub mod forecast;
pub mod region;

pub use forecast::{ForecastBundle, ForecastRecord};
pub use region::Region;
