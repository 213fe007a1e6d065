//! Location FFI exports.

use super::{CreateLocationParams, Location, LocationUpdate};
use crate::error::{OptionExt, Result};
use crate::ffi::PathwayCore;
use crate::types::Region;

#[uniffi::export]
impl PathwayCore {
    /// Add a stop to a trip and return its id.
    pub fn create_location(&self, params: CreateLocationParams) -> Result<String> {
        self.with_db(|db| db.create_location(&params))
    }

    /// Stops of a trip in the order they were added.
    pub fn list_locations_by_trip(&self, trip_id: String) -> Result<Vec<Location>> {
        self.with_db(|db| db.list_locations_by_trip(&trip_id))
    }

    pub fn get_location(&self, location_id: String) -> Result<Option<Location>> {
        self.with_db(|db| db.get_location(&location_id))
    }

    pub fn update_location(&self, location_id: String, update: LocationUpdate) -> Result<()> {
        self.with_db(|db| db.update_location(&location_id, &update))
    }

    /// Returns false if the stop did not exist.
    pub fn delete_location(&self, location_id: String) -> Result<bool> {
        self.with_db(|db| db.delete_location(&location_id))
    }

    /// Map region framing every stop of a trip. Fails if the trip is unknown.
    pub fn trip_region(&self, trip_id: String) -> Result<Region> {
        self.with_db(|db| {
            db.get_trip(&trip_id)?.ok_or_trip_not_found(&trip_id)?;
            db.trip_region(&trip_id)
        })
    }

    /// Straight-line route length in kilometers. Fails if the trip is unknown.
    pub fn trip_distance_km(&self, trip_id: String) -> Result<f64> {
        self.with_db(|db| {
            db.get_trip(&trip_id)?.ok_or_trip_not_found(&trip_id)?;
            db.trip_distance_km(&trip_id)
        })
    }
}
