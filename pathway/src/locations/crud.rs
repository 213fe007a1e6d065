//! Location CRUD operations.

use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::{CreateLocationParams, Location, LocationUpdate};
use crate::error::{PathwayError, Result};
use crate::geo_utils::{format_coordinate_address, region_for_coordinates, route_distance_km};
use crate::persistence::TripDatabase;
use crate::trips::normalize_text;
use crate::types::{Coordinate, Region};

const LOCATION_COLUMNS: &str =
    "id, tripId, name, description, latitude, longitude, address, visitDate, notes, createdAt";

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        trip_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        address: row.get(6)?,
        visit_date: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn optional_text(value: &str) -> Value {
    normalize_text(Some(value))
        .map(Value::Text)
        .unwrap_or(Value::Null)
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

impl TripDatabase {
    /// Add a stop to a trip and return its id.
    ///
    /// The trip must exist; SQLite's foreign key check rejects the insert
    /// otherwise and the error surfaces as [`PathwayError::TripNotFound`].
    pub fn create_location(&mut self, params: &CreateLocationParams) -> Result<String> {
        params.check_required()?;

        let address = normalize_text(params.address.as_deref())
            .unwrap_or_else(|| format_coordinate_address(params.latitude, params.longitude));

        let stamp = self.next_stamp();
        let inserted = self.db.execute(
            "INSERT INTO locations
             (id, tripId, name, description, latitude, longitude, address, visitDate, notes, createdAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                stamp.id,
                params.trip_id,
                params.name.trim(),
                normalize_text(params.description.as_deref()),
                params.latitude,
                params.longitude,
                address,
                normalize_text(params.visit_date.as_deref()),
                normalize_text(params.notes.as_deref()),
                stamp.timestamp,
            ],
        );

        match inserted {
            Ok(_) => {
                log::debug!(
                    "[TripDatabase] Added location {} to trip {}",
                    stamp.id,
                    params.trip_id
                );
                Ok(stamp.id)
            }
            Err(e) if is_foreign_key_violation(&e) => {
                Err(PathwayError::TripNotFound(params.trip_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stops of a trip in the order they were added.
    pub fn list_locations_by_trip(&self, trip_id: &str) -> Result<Vec<Location>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM locations WHERE tripId = ?1 ORDER BY createdAt ASC, rowid ASC",
            LOCATION_COLUMNS
        ))?;

        let locations = stmt
            .query_map(params![trip_id], location_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(locations)
    }

    /// Single stop by id, `None` if it does not exist.
    pub fn get_location(&self, id: &str) -> Result<Option<Location>> {
        let location = self
            .db
            .query_row(
                &format!("SELECT {} FROM locations WHERE id = ?1", LOCATION_COLUMNS),
                params![id],
                location_from_row,
            )
            .optional()?;

        Ok(location)
    }

    /// Apply the supplied fields to a stop.
    ///
    /// Fails with [`PathwayError::LocationNotFound`] when no stop has this id.
    pub fn update_location(&mut self, id: &str, update: &LocationUpdate) -> Result<()> {
        update.check()?;

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(Value::Text(name.trim().to_string()));
        }
        if let Some(description) = &update.description {
            assignments.push("description = ?");
            values.push(optional_text(description));
        }
        if let Some(coordinate) = &update.coordinate {
            assignments.push("latitude = ?");
            values.push(Value::Real(coordinate.latitude));
            assignments.push("longitude = ?");
            values.push(Value::Real(coordinate.longitude));
        }
        if let Some(address) = &update.address {
            assignments.push("address = ?");
            values.push(optional_text(address));
        }
        if let Some(visit_date) = &update.visit_date {
            assignments.push("visitDate = ?");
            values.push(optional_text(visit_date));
        }
        if let Some(notes) = &update.notes {
            assignments.push("notes = ?");
            values.push(optional_text(notes));
        }

        // Nothing to write, but a missing id is still reported
        if assignments.is_empty() {
            let exists: bool = self.db.query_row(
                "SELECT EXISTS(SELECT 1 FROM locations WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(PathwayError::LocationNotFound(id.to_string()));
            }
            return Ok(());
        }

        values.push(Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE locations SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let changed = self.db.execute(&sql, params_from_iter(values))?;

        if changed == 0 {
            return Err(PathwayError::LocationNotFound(id.to_string()));
        }

        log::debug!("[TripDatabase] Updated location {}", id);
        Ok(())
    }

    /// Delete a single stop. Returns whether a stop was removed.
    pub fn delete_location(&mut self, id: &str) -> Result<bool> {
        let deleted = self
            .db
            .execute("DELETE FROM locations WHERE id = ?1", params![id])?;

        if deleted > 0 {
            log::debug!("[TripDatabase] Deleted location {}", id);
        }
        Ok(deleted > 0)
    }

    /// Number of stops in a trip.
    pub fn location_count(&self, trip_id: &str) -> Result<u32> {
        let count: u32 = self.db.query_row(
            "SELECT COUNT(*) FROM locations WHERE tripId = ?1",
            params![trip_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Map region framing every stop of a trip.
    pub fn trip_region(&self, trip_id: &str) -> Result<Region> {
        let points: Vec<Coordinate> = self
            .list_locations_by_trip(trip_id)?
            .iter()
            .map(Location::coordinate)
            .collect();
        Ok(region_for_coordinates(&points))
    }

    /// Straight-line length of a trip's route in kilometers, visiting stops in order.
    pub fn trip_distance_km(&self, trip_id: &str) -> Result<f64> {
        let points: Vec<Coordinate> = self
            .list_locations_by_trip(trip_id)?
            .iter()
            .map(Location::coordinate)
            .collect();
        Ok(route_distance_km(&points))
    }
}
