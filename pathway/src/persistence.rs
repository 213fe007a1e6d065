//! # Trip Database
//!
//! SQLite-backed storage for trips and their stops.
//!
//! The handle is opened once at startup and passed to whoever needs it; every
//! call after [`TripDatabase::open`] runs against a migrated schema with
//! foreign keys enforced, so deleting a trip cascades to its locations.
//!
//! Trip and location operations live in [`crate::trips::crud`] and
//! [`crate::locations::crud`] as further `impl TripDatabase` blocks.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::migrations;

// ============================================================================
// Timestamps
// ============================================================================

/// Format a UTC instant the way records store it: RFC 3339, millisecond precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as an ISO 8601 timestamp.
pub fn current_timestamp_iso() -> String {
    format_timestamp(Utc::now())
}

/// Id and timestamp allocated together for a new or modified record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordStamp {
    pub id: String,
    pub timestamp: String,
}

// ============================================================================
// Stats
// ============================================================================

/// Row counts for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct DatabaseStats {
    pub trip_count: u32,
    pub location_count: u32,
    pub schema_version: u32,
}

// ============================================================================
// Database Handle
// ============================================================================

/// SQLite store for trips and locations.
pub struct TripDatabase {
    /// Database connection
    pub(crate) db: Connection,

    /// Database path (":memory:" for in-memory databases)
    db_path: String,

    /// Last millisecond handed out as a record id; ids never repeat
    last_stamp_millis: i64,
}

impl TripDatabase {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) the database at `path` and migrate it to the latest schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Connection::open(path)?;
        Self::from_connection(db, path.to_string_lossy().into_owned())
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn from_connection(mut db: Connection, db_path: String) -> Result<Self> {
        log::info!("[TripDatabase] Opening database: {}", db_path);

        // Must run outside a transaction, so before the migrations
        db.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate_to_latest(&mut db)?;

        let last_stamp_millis = Self::max_record_id(&db)?;

        log::info!("[TripDatabase] Ready: {}", db_path);

        Ok(Self {
            db,
            db_path,
            last_stamp_millis,
        })
    }

    /// Highest numeric id stored so far, so a clock that moved backwards
    /// cannot reissue an existing id.
    fn max_record_id(db: &Connection) -> Result<i64> {
        let max: Option<i64> = db
            .query_row(
                "SELECT MAX(CAST(id AS INTEGER)) FROM (
                    SELECT id FROM trips UNION ALL SELECT id FROM locations
                 )",
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(max.unwrap_or(0))
    }

    /// Path the database was opened from.
    pub fn path(&self) -> &str {
        &self.db_path
    }

    // ========================================================================
    // Record Stamps
    // ========================================================================

    /// Allocate a time-based id and its matching timestamp.
    ///
    /// Ids are milliseconds since the epoch. Two calls within the same
    /// millisecond get consecutive values, so ids stay unique and their
    /// timestamps keep creation order.
    pub(crate) fn next_stamp(&mut self) -> RecordStamp {
        let now = Utc::now();
        let millis = now.timestamp_millis().max(self.last_stamp_millis + 1);
        self.last_stamp_millis = millis;

        let at = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(now);
        RecordStamp {
            id: millis.to_string(),
            timestamp: format_timestamp(at),
        }
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Delete every trip; locations and routes follow by cascade.
    pub fn clear_all(&mut self) -> Result<()> {
        let deleted = self.db.execute("DELETE FROM trips", [])?;
        log::info!("[TripDatabase] Cleared {} trips", deleted);
        Ok(())
    }

    /// Row counts and schema version.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let trip_count: u32 = self
            .db
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        let location_count: u32 = self
            .db
            .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;
        let schema_version = migrations::current_version(&self.db)? as u32;

        Ok(DatabaseStats {
            trip_count,
            location_count,
            schema_version,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_database() {
        let db = TripDatabase::in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.trip_count, 0);
        assert_eq!(stats.location_count, 0);
        assert_eq!(stats.schema_version as usize, migrations::LATEST_VERSION);
        assert_eq!(db.path(), ":memory:");
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = TripDatabase::in_memory().unwrap();
        let enabled: i64 = db
            .db
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_stamps_are_unique_and_ordered() {
        let mut db = TripDatabase::in_memory().unwrap();
        let stamps: Vec<RecordStamp> = (0..100).map(|_| db.next_stamp()).collect();

        for pair in stamps.windows(2) {
            let a: i64 = pair[0].id.parse().unwrap();
            let b: i64 = pair[1].id.parse().unwrap();
            assert!(b > a);
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
    }

    #[test]
    fn test_timestamp_format() {
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(format_timestamp(at), "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_reopen_continues_after_stored_ids() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pathway.db");

        {
            let db = TripDatabase::open(&path).unwrap();
            // A far-future id simulates a clock that has since moved backwards
            db.db
                .execute(
                    "INSERT INTO trips (id, title, startDate, endDate, createdAt, updatedAt)
                     VALUES ('99999999999999', 'Future', '2030-01-01', '2030-01-02',
                             '2030-01-01T00:00:00.000Z', '2030-01-01T00:00:00.000Z')",
                    [],
                )
                .unwrap();
        }

        let mut db = TripDatabase::open(&path).unwrap();
        let stamp = db.next_stamp();
        assert_eq!(stamp.id, "100000000000000");
    }
}
