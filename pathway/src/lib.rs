//! Pathway - local persistence core for the Pathway trip planner
//!
//! This crate provides:
//! - SQLite storage for trips and their stops
//! - Key-value backed app settings
//! - Offline map region records on the filesystem
//! - UniFFI bindings for iOS/Android

use std::time::Instant;

pub mod config;
pub mod error;
pub mod geo_utils;
pub mod migrations;
pub mod types;

pub use config::PathwayConfig;
pub use error::{OptionExt, PathwayError, Result};
pub use types::{Coordinate, OfflineMap, Region};

// Trip and location storage
pub mod locations;
pub mod persistence;
pub mod trips;
pub use locations::{CreateLocationParams, Location, LocationUpdate};
pub use persistence::{DatabaseStats, TripDatabase, current_timestamp_iso};
pub use trips::{CreateTripParams, Trip, TripUpdate};

// Settings and offline maps
pub mod offline_maps;
pub mod settings;
pub use offline_maps::OfflineMapRegistry;
pub use settings::{
    AppSettings, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SettingsPatch,
    SettingsStore,
};

// FFI bindings for mobile platforms
pub mod ffi;
pub use ffi::{KeyValueBackend, PathwayCore};

uniffi::setup_scaffolding!();

/// Milliseconds elapsed since `start`, for timing logs.
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Initialize logging for Android
#[cfg(target_os = "android")]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("pathway"),
    );
}

/// Initialize logging for iOS
#[cfg(target_os = "ios")]
pub(crate) fn init_logging() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Another logger may already be installed by the host
        let _ = oslog::OsLogger::new("app.pathway.core")
            .level_filter(log::LevelFilter::Debug)
            .init();
    });
}

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub(crate) fn init_logging() {
    // No-op elsewhere; tests install env_logger
}
