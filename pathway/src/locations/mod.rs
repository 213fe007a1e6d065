//! Location (stop) types and operations.
//!
//! Locations belong to exactly one trip. Their creation order is the route
//! order shown to the user, so listing is always oldest first.

use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};
use crate::geo_utils::is_valid_coordinate;
use crate::types::Coordinate;

pub mod crud;
pub mod ffi;

/// A stored stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub visit_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Parameters for adding a stop to a trip.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct CreateLocationParams {
    pub trip_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    /// Defaults to the formatted coordinates when absent
    pub address: Option<String>,
    pub visit_date: Option<String>,
    pub notes: Option<String>,
}

impl CreateLocationParams {
    pub fn new(
        trip_id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            name: name.into(),
            latitude,
            longitude,
            description: None,
            address: None,
            visit_date: None,
            notes: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Required fields: trip id, non-blank name, coordinates within WGS84 bounds.
    pub fn check_required(&self) -> Result<()> {
        if self.trip_id.trim().is_empty() {
            return Err(PathwayError::invalid("trip_id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(PathwayError::invalid("name", "must not be empty"));
        }
        check_coordinate(self.latitude, self.longitude)
    }
}

/// Partial update of a stop. `None` leaves a field untouched; empty text
/// clears an optional field.
///
/// Coordinates are updated as a pair.
#[derive(Debug, Clone, Default, PartialEq, uniffi::Record)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub address: Option<String>,
    pub visit_date: Option<String>,
    pub notes: Option<String>,
}

impl LocationUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.coordinate.is_none()
            && self.address.is_none()
            && self.visit_date.is_none()
            && self.notes.is_none()
    }

    pub(crate) fn check(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(PathwayError::invalid("name", "must not be empty"));
            }
        }
        if let Some(c) = &self.coordinate {
            check_coordinate(c.latitude, c.longitude)?;
        }
        Ok(())
    }
}

fn check_coordinate(latitude: f64, longitude: f64) -> Result<()> {
    if !is_valid_coordinate(latitude, longitude) {
        return Err(PathwayError::invalid(
            "coordinate",
            format!("({}, {}) is outside WGS84 bounds", latitude, longitude),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_required() {
        let ok = CreateLocationParams::new("1", "Hagia Sophia", 41.0086, 28.9802);
        assert!(ok.check_required().is_ok());

        let no_name = CreateLocationParams::new("1", " ", 41.0, 28.9);
        assert!(matches!(
            no_name.check_required(),
            Err(PathwayError::InvalidInput { field: "name", .. })
        ));

        let no_trip = CreateLocationParams::new("", "Galata", 41.0, 28.9);
        assert!(matches!(
            no_trip.check_required(),
            Err(PathwayError::InvalidInput { field: "trip_id", .. })
        ));

        let bad_lat = CreateLocationParams::new("1", "Nowhere", 91.0, 0.0);
        assert!(matches!(
            bad_lat.check_required(),
            Err(PathwayError::InvalidInput { field: "coordinate", .. })
        ));
    }

    #[test]
    fn test_update_check() {
        assert!(LocationUpdate::default().is_empty());

        let bad = LocationUpdate {
            coordinate: Some(Coordinate::new(0.0, 200.0)),
            ..Default::default()
        };
        assert!(!bad.is_empty());
        assert!(bad.check().is_err());
    }
}
