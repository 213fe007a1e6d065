//! Shared value types for persistence and FFI.
//!
//! These are plain data containers used by more than one store: map regions
//! appear in both the settings bundle and offline map metadata.

use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};
use crate::geo_utils::is_valid_coordinate;

// ============================================================================
// Map Geometry
// ============================================================================

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A visible map region: center point plus latitude/longitude span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Center latitude
    pub latitude: f64,
    /// Center longitude
    pub longitude: f64,
    /// Total latitude span in degrees
    pub latitude_delta: f64,
    /// Total longitude span in degrees
    pub longitude_delta: f64,
}

impl Region {
    pub fn new(latitude: f64, longitude: f64, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            latitude,
            longitude,
            latitude_delta,
            longitude_delta,
        }
    }

    /// Center point of the region.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Center within WGS84 bounds and finite, non-negative spans. Stored
    /// regions must round-trip through JSON.
    pub fn check(&self) -> Result<()> {
        if !is_valid_coordinate(self.latitude, self.longitude) {
            return Err(PathwayError::invalid(
                "region",
                format!(
                    "center ({}, {}) is outside WGS84 bounds",
                    self.latitude, self.longitude
                ),
            ));
        }
        for delta in [self.latitude_delta, self.longitude_delta] {
            if !delta.is_finite() || delta < 0.0 {
                return Err(PathwayError::invalid(
                    "region",
                    format!("span {} must be finite and non-negative", delta),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Offline Maps
// ============================================================================

/// Metadata of a downloaded offline map region.
///
/// Serialized as-is into the map's `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct OfflineMap {
    /// Directory name of the map, `map_<millis>`
    pub id: String,
    /// User-visible name
    pub name: String,
    /// Region covered by the download
    pub region: Region,
    /// RFC 3339 timestamp of download completion
    pub downloaded_at: String,
    /// Payload size in bytes
    pub file_size: u64,
}
