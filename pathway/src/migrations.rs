//! Schema migrations.
//!
//! Applied in order by [`crate::persistence::TripDatabase::open`]. The applied
//! version is tracked in SQLite's `user_version` pragma, so every entry here is
//! append-only: never edit a migration that has shipped.

use once_cell::sync::Lazy;
use rusqlite::Connection;
use rusqlite_migration::{M, Migrations, SchemaVersion};

/// Initial schema: trips, their stops, and the reserved routes table.
const CREATE_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS trips (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        startDate TEXT NOT NULL,
        endDate TEXT NOT NULL,
        createdAt TEXT NOT NULL,
        updatedAt TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS locations (
        id TEXT PRIMARY KEY,
        tripId TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        address TEXT,
        visitDate TEXT,
        notes TEXT,
        createdAt TEXT NOT NULL,
        FOREIGN KEY (tripId) REFERENCES trips (id) ON DELETE CASCADE
    );

    -- Reserved for planned routes; nothing reads or writes it yet
    CREATE TABLE IF NOT EXISTS routes (
        id TEXT PRIMARY KEY,
        tripId TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        createdAt TEXT NOT NULL,
        FOREIGN KEY (tripId) REFERENCES trips (id) ON DELETE CASCADE
    );
"#;

/// Indexes backing the two list queries.
const CREATE_INDEXES: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_trips_created_at ON trips(createdAt);
    CREATE INDEX IF NOT EXISTS idx_locations_trip_created_at ON locations(tripId, createdAt);
    CREATE INDEX IF NOT EXISTS idx_routes_trip ON routes(tripId);
"#;

static MIGRATIONS: Lazy<Migrations<'static>> =
    Lazy::new(|| Migrations::new(vec![M::up(CREATE_TABLES), M::up(CREATE_INDEXES)]));

/// Schema version reached after all migrations are applied.
pub const LATEST_VERSION: usize = 2;

/// Bring the schema up to the latest version.
pub fn migrate_to_latest(conn: &mut Connection) -> Result<(), rusqlite_migration::Error> {
    let before = MIGRATIONS.current_version(conn)?;
    MIGRATIONS.to_latest(conn)?;
    let after = MIGRATIONS.current_version(conn)?;

    let (before, after) = (describe(&before), describe(&after));
    if before != after {
        log::info!("[Migrations] Schema migrated from {} to {}", before, after);
    } else {
        log::debug!("[Migrations] Schema already at {}", after);
    }

    Ok(())
}

/// Current schema version, 0 for an empty database.
pub fn current_version(conn: &Connection) -> Result<usize, rusqlite_migration::Error> {
    Ok(match MIGRATIONS.current_version(conn)? {
        SchemaVersion::Inside(v) | SchemaVersion::Outside(v) => v.get(),
        SchemaVersion::NoneSet => 0,
    })
}

fn describe(version: &SchemaVersion) -> String {
    match version {
        SchemaVersion::NoneSet => "empty".to_string(),
        SchemaVersion::Inside(v) => format!("v{}", v),
        SchemaVersion::Outside(v) => format!("v{} (newer than this build)", v),
    }
}
