//! Unified error handling for the Pathway core.
//!
//! Every store operation returns [`Result`]. Absence on lookups is modelled as
//! `Ok(None)`; the not-found variants here are only produced by mutations that
//! need an existing record to act on.

use thiserror::Error;

/// Unified error type for Pathway store operations.
///
/// Exported across the FFI boundary as a flat error: the host receives the
/// variant name plus the `Display` message.
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum PathwayError {
    /// Malformed or missing required field, rejected before reaching storage
    #[error("invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    /// Trip id does not reference an existing trip
    #[error("trip '{0}' not found")]
    TripNotFound(String),

    /// Location id does not reference an existing location
    #[error("location '{0}' not found")]
    LocationNotFound(String),

    /// No offline map matches the given id or name
    #[error("offline map '{0}' not found")]
    MapNotFound(String),

    /// SQLite error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Schema migration error
    #[error("migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key-value backend failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl PathwayError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        PathwayError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// True for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PathwayError::TripNotFound(_)
                | PathwayError::LocationNotFound(_)
                | PathwayError::MapNotFound(_)
        )
    }
}

/// Result type alias for Pathway operations.
pub type Result<T> = std::result::Result<T, PathwayError>;

/// Extension trait for converting Option to a not-found error.
pub trait OptionExt<T> {
    /// Convert Option to Result with a trip-not-found error.
    fn ok_or_trip_not_found(self, trip_id: &str) -> Result<T>;

    /// Convert Option to Result with a location-not-found error.
    fn ok_or_location_not_found(self, location_id: &str) -> Result<T>;

    /// Convert Option to Result with a map-not-found error.
    fn ok_or_map_not_found(self, map: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_trip_not_found(self, trip_id: &str) -> Result<T> {
        self.ok_or_else(|| PathwayError::TripNotFound(trip_id.to_string()))
    }

    fn ok_or_location_not_found(self, location_id: &str) -> Result<T> {
        self.ok_or_else(|| PathwayError::LocationNotFound(location_id.to_string()))
    }

    fn ok_or_map_not_found(self, map: &str) -> Result<T> {
        self.ok_or_else(|| PathwayError::MapNotFound(map.to_string()))
    }
}
