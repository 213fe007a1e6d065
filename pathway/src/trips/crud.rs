//! Trip CRUD operations.

use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::{CreateTripParams, Trip, TripUpdate, normalize_text};
use crate::error::{PathwayError, Result};
use crate::persistence::TripDatabase;

const TRIP_COLUMNS: &str = "id, title, description, startDate, endDate, createdAt, updatedAt";

fn trip_from_row(row: &Row<'_>) -> rusqlite::Result<Trip> {
    Ok(Trip {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn optional_text(value: Option<String>) -> Value {
    value.map(Value::Text).unwrap_or(Value::Null)
}

impl TripDatabase {
    /// Create a trip and return its id.
    ///
    /// Only required fields are checked; date order is the caller's concern
    /// (see [`CreateTripParams::validate`]).
    pub fn create_trip(&mut self, params: &CreateTripParams) -> Result<String> {
        params.check_required()?;

        let stamp = self.next_stamp();
        self.db.execute(
            "INSERT INTO trips (id, title, description, startDate, endDate, createdAt, updatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                stamp.id,
                params.title.trim(),
                normalize_text(params.description.as_deref()),
                params.start_date,
                params.end_date,
                stamp.timestamp,
            ],
        )?;

        log::debug!("[TripDatabase] Created trip {}", stamp.id);
        Ok(stamp.id)
    }

    /// All trips, most recently created first.
    pub fn list_trips(&self) -> Result<Vec<Trip>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM trips ORDER BY createdAt DESC, rowid DESC",
            TRIP_COLUMNS
        ))?;

        let trips = stmt
            .query_map([], trip_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(trips)
    }

    /// Single trip by id, `None` if it does not exist.
    pub fn get_trip(&self, id: &str) -> Result<Option<Trip>> {
        let trip = self
            .db
            .query_row(
                &format!("SELECT {} FROM trips WHERE id = ?1", TRIP_COLUMNS),
                params![id],
                trip_from_row,
            )
            .optional()?;

        Ok(trip)
    }

    /// Apply the supplied fields and refresh `updatedAt`.
    ///
    /// Fails with [`PathwayError::TripNotFound`] when no trip has this id.
    pub fn update_trip(&mut self, id: &str, update: &TripUpdate) -> Result<()> {
        update.check()?;

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(title) = &update.title {
            assignments.push("title = ?");
            values.push(Value::Text(title.trim().to_string()));
        }
        if let Some(description) = &update.description {
            assignments.push("description = ?");
            values.push(optional_text(normalize_text(Some(description))));
        }
        if let Some(start_date) = &update.start_date {
            assignments.push("startDate = ?");
            values.push(Value::Text(start_date.clone()));
        }
        if let Some(end_date) = &update.end_date {
            assignments.push("endDate = ?");
            values.push(Value::Text(end_date.clone()));
        }

        let stamp = self.next_stamp();
        assignments.push("updatedAt = ?");
        values.push(Value::Text(stamp.timestamp));
        values.push(Value::Text(id.to_string()));

        let sql = format!("UPDATE trips SET {} WHERE id = ?", assignments.join(", "));
        let changed = self.db.execute(&sql, params_from_iter(values))?;

        if changed == 0 {
            return Err(PathwayError::TripNotFound(id.to_string()));
        }

        log::debug!("[TripDatabase] Updated trip {}", id);
        Ok(())
    }

    /// Delete a trip and, by cascade, all of its locations.
    ///
    /// Returns whether a trip was removed; a missing id is not an error.
    pub fn delete_trip(&mut self, id: &str) -> Result<bool> {
        let deleted = self
            .db
            .execute("DELETE FROM trips WHERE id = ?1", params![id])?;

        if deleted > 0 {
            log::debug!("[TripDatabase] Deleted trip {}", id);
        }
        Ok(deleted > 0)
    }

    /// Whether a trip with this id exists.
    pub fn has_trip(&self, id: &str) -> Result<bool> {
        let exists: bool = self.db.query_row(
            "SELECT EXISTS(SELECT 1 FROM trips WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Number of stored trips.
    pub fn trip_count(&self) -> Result<u32> {
        let count: u32 = self
            .db
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        Ok(count)
    }
}
