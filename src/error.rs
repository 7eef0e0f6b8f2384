//! Error types and handling for the `tenki` forecast cache

use crate::models::ForecastBundle;
use thiserror::Error;

/// Main error type for the `tenki` forecast cache
#[derive(Error, Debug)]
pub enum TenkiError {
    /// The region metadata source could not be reached
    #[error("metadata source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// The region metadata response is missing its region collection
    #[error("malformed region metadata: {message}")]
    MalformedMetadata { message: String },

    /// The forecast payload is missing its time-series structure
    #[error("malformed forecast payload: {message}")]
    MalformedPayload { message: String },

    /// A region code that was never loaded into the directory
    #[error("unknown region code: {code}")]
    UnknownRegion { code: String },

    /// The forecast fetch for a region failed (network error or timeout)
    #[error("forecast fetch failed for region {code}: {message}")]
    FetchFailed { code: String, message: String },

    /// A write to the forecast store failed
    #[error("forecast store write failed: {source}")]
    StorageWriteFailed {
        #[source]
        source: sqlx::Error,
    },

    /// A read from the forecast store failed
    #[error("forecast store read failed: {source}")]
    StorageReadFailed {
        #[source]
        source: sqlx::Error,
    },

    /// The fetch succeeded but one or more records could not be cached.
    /// Carries the fetched bundle so the caller can still display it.
    #[error("sync fetched the forecast but {failed} record(s) could not be cached")]
    SyncPartiallyFailed {
        bundle: Box<ForecastBundle>,
        failed: usize,
    },
}

impl TenkiError {
    /// Create a new source-unavailable error
    pub fn source_unavailable<S: Into<String>>(message: S) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create a new malformed-metadata error
    pub fn malformed_metadata<S: Into<String>>(message: S) -> Self {
        Self::MalformedMetadata {
            message: message.into(),
        }
    }

    /// Create a new malformed-payload error
    pub fn malformed_payload<S: Into<String>>(message: S) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a new unknown-region error
    pub fn unknown_region<S: Into<String>>(code: S) -> Self {
        Self::UnknownRegion { code: code.into() }
    }

    /// Create a new fetch-failed error
    pub fn fetch_failed<C: Into<String>, S: Into<String>>(code: C, message: S) -> Self {
        Self::FetchFailed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Get a user-friendly error message for the presentation layer
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TenkiError::SourceUnavailable { .. } => {
                "Unable to reach the region directory. Please check your internet connection."
                    .to_string()
            }
            TenkiError::MalformedMetadata { .. } => {
                "The region directory returned data in an unexpected format.".to_string()
            }
            TenkiError::MalformedPayload { .. } => {
                "The forecast service returned data in an unexpected format.".to_string()
            }
            TenkiError::UnknownRegion { code } => {
                format!("Unknown region code: {code}")
            }
            TenkiError::FetchFailed { code, .. } => {
                format!("Could not fetch the forecast for region {code}. Please try again.")
            }
            TenkiError::StorageWriteFailed { .. } | TenkiError::StorageReadFailed { .. } => {
                "The local forecast store could not be accessed.".to_string()
            }
            TenkiError::SyncPartiallyFailed { failed, .. } => {
                format!("Forecast loaded, but {failed} record(s) could not be cached locally.")
            }
        }
    }
}
