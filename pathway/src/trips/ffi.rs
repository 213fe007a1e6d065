//! Trip FFI exports.

use super::{CreateTripParams, Trip, TripUpdate};
use crate::error::Result;
use crate::ffi::PathwayCore;

#[uniffi::export]
impl PathwayCore {
    /// Create a trip and return its id.
    pub fn create_trip(&self, params: CreateTripParams) -> Result<String> {
        self.with_db(|db| db.create_trip(&params))
    }

    /// All trips, most recently created first.
    pub fn list_trips(&self) -> Result<Vec<Trip>> {
        self.with_db(|db| db.list_trips())
    }

    /// Single trip by id, or None.
    pub fn get_trip(&self, trip_id: String) -> Result<Option<Trip>> {
        self.with_db(|db| db.get_trip(&trip_id))
    }

    /// Apply a partial update to a trip.
    pub fn update_trip(&self, trip_id: String, update: TripUpdate) -> Result<()> {
        self.with_db(|db| db.update_trip(&trip_id, &update))
    }

    /// Delete a trip and its stops. Returns false if the trip did not exist.
    pub fn delete_trip(&self, trip_id: String) -> Result<bool> {
        self.with_db(|db| db.delete_trip(&trip_id))
    }

    /// Run the create-trip form rules without storing anything.
    pub fn validate_trip(&self, params: CreateTripParams) -> Result<()> {
        params.validate()
    }
}
