//! FFI bindings for mobile platforms (iOS/Android).
//!
//! The host builds one [`PathwayCore`] at startup and keeps it for the life of
//! the app. It owns the trip database, the settings store and the offline map
//! registry; trip and location methods are exported from
//! [`crate::trips::ffi`] and [`crate::locations::ffi`].
//!
//! Offline map operations are async internally and run to completion on the
//! core's own tokio runtime, so every exported method is a plain blocking call.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::info;

use crate::config::PathwayConfig;
use crate::error::{PathwayError, Result};
use crate::geo_utils;
use crate::offline_maps::OfflineMapRegistry;
use crate::persistence::{DatabaseStats, TripDatabase};
use crate::settings::{AppSettings, KeyValueStore, SettingsPatch, SettingsStore};
use crate::types::{Coordinate, OfflineMap, Region};
use crate::{elapsed_ms, init_logging};

// ============================================================================
// Callback Interfaces
// ============================================================================

/// Host key-value storage (AsyncStorage, UserDefaults, SharedPreferences).
/// Implement this in TypeScript/Kotlin/Swift and pass it to [`PathwayCore::new`].
#[uniffi::export(callback_interface)]
pub trait KeyValueBackend: Send + Sync {
    /// Stored value, or None if the key is unset.
    fn get_item(&self, key: String) -> Option<String>;

    /// Returns false if the value could not be stored.
    fn set_item(&self, key: String, value: String) -> bool;

    /// Returns false if the key could not be removed. Removing an unset key succeeds.
    fn remove_item(&self, key: String) -> bool;
}

/// Adapts a host [`KeyValueBackend`] to [`KeyValueStore`].
struct ForeignKeyValueStore {
    backend: Box<dyn KeyValueBackend>,
}

impl KeyValueStore for ForeignKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.backend.get_item(key.to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.backend.set_item(key.to_string(), value.to_string()) {
            Ok(())
        } else {
            Err(PathwayError::Storage(format!("host failed to store '{}'", key)))
        }
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        if self.backend.remove_item(key.to_string()) {
            Ok(())
        } else {
            Err(PathwayError::Storage(format!("host failed to remove '{}'", key)))
        }
    }
}

// ============================================================================
// Core Handle
// ============================================================================

/// Handle to all Pathway stores.
#[derive(uniffi::Object)]
pub struct PathwayCore {
    db: Mutex<TripDatabase>,
    settings: SettingsStore,
    maps: OfflineMapRegistry,
    runtime: tokio::runtime::Runtime,
}

impl PathwayCore {
    /// Open every store described by `config`, keeping settings in `kv`.
    pub fn open(config: &PathwayConfig, kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let start = Instant::now();

        let db = TripDatabase::open(config.database_path())?;
        let settings = SettingsStore::new(kv, config.settings_key.clone());
        let maps = OfflineMapRegistry::from_config(config);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("pathway-io")
            .enable_time()
            .build()?;
        runtime.block_on(maps.init())?;

        info!(
            "[PathwayCore] Opened {} ({} ms)",
            config.data_dir.display(),
            elapsed_ms(start)
        );

        Ok(Self {
            db: Mutex::new(db),
            settings,
            maps,
            runtime,
        })
    }

    /// Run `f` with exclusive access to the trip database.
    pub(crate) fn with_db<R>(
        &self,
        f: impl FnOnce(&mut TripDatabase) -> Result<R>,
    ) -> Result<R> {
        let mut db = self
            .db
            .lock()
            .map_err(|_| PathwayError::Storage("database lock poisoned".to_string()))?;
        f(&mut db)
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn offline_maps(&self) -> &OfflineMapRegistry {
        &self.maps
    }
}

#[uniffi::export]
impl PathwayCore {
    /// Open the stores under `data_dir`, keeping settings in the host's
    /// key-value storage.
    #[uniffi::constructor]
    pub fn new(
        data_dir: String,
        kv: Box<dyn KeyValueBackend>,
    ) -> std::result::Result<Arc<Self>, PathwayError> {
        init_logging();
        let config = PathwayConfig::with_data_dir(&data_dir);
        let kv: Arc<dyn KeyValueStore> = Arc::new(ForeignKeyValueStore { backend: kv });
        Ok(Arc::new(Self::open(&config, kv)?))
    }

    // ------------------------------------------------------------------------
    // Database
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> Result<DatabaseStats> {
        self.with_db(|db| db.stats())
    }

    /// Delete every trip and stop.
    pub fn clear_all_trips(&self) -> Result<()> {
        self.with_db(|db| db.clear_all())
    }

    pub fn database_path(&self) -> Result<String> {
        self.with_db(|db| Ok(db.path().to_string()))
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Current settings; defaults if nothing readable is stored.
    pub fn get_settings(&self) -> AppSettings {
        self.settings.read()
    }

    /// Merge `patch` into the stored settings and return the result.
    pub fn save_settings(&self, patch: SettingsPatch) -> Result<AppSettings> {
        self.settings.write(&patch)
    }

    pub fn reset_settings(&self) -> Result<()> {
        self.settings.reset()
    }

    pub fn get_offline_mode(&self) -> bool {
        self.settings.offline_mode()
    }

    pub fn set_offline_mode(&self, enabled: bool) -> Result<()> {
        self.settings.set_offline_mode(enabled)
    }

    pub fn get_auto_download_maps(&self) -> bool {
        self.settings.auto_download_maps()
    }

    pub fn set_auto_download_maps(&self, enabled: bool) -> Result<()> {
        self.settings.set_auto_download_maps(enabled)
    }

    pub fn get_last_downloaded_region(&self) -> Option<Region> {
        self.settings.last_downloaded_region()
    }

    pub fn set_last_downloaded_region(&self, region: Option<Region>) -> Result<()> {
        self.settings.set_last_downloaded_region(region)
    }

    // ------------------------------------------------------------------------
    // Offline Maps
    // ------------------------------------------------------------------------

    /// Download `region` under `name`. Blocks for the simulated download time.
    pub fn download_map_region(
        &self,
        region: Region,
        name: String,
        zoom_level: Option<u8>,
    ) -> Result<String> {
        let start = Instant::now();
        let map_id = self
            .runtime
            .block_on(self.maps.download_region(region, &name, zoom_level))?;
        info!(
            "[PathwayCore] download_map_region '{}' -> {} ({} ms)",
            name,
            map_id,
            elapsed_ms(start)
        );
        Ok(map_id)
    }

    /// Download the default region under `name`.
    pub fn download_map(&self, name: String) -> Result<String> {
        self.runtime.block_on(self.maps.download_default(&name))
    }

    pub fn list_offline_maps(&self) -> Result<Vec<OfflineMap>> {
        self.runtime.block_on(self.maps.list())
    }

    pub fn get_offline_map(&self, map_id: String) -> Result<Option<OfflineMap>> {
        self.runtime.block_on(self.maps.get(&map_id))
    }

    /// Returns false if no such map exists.
    pub fn delete_offline_map(&self, map_id: String) -> Result<bool> {
        self.runtime.block_on(self.maps.delete_by_id(&map_id))
    }

    /// Fails with MapNotFound if no map has this name.
    pub fn delete_map_by_name(&self, name: String) -> Result<()> {
        self.runtime.block_on(self.maps.delete_by_name(&name))
    }

    /// Returns the number of maps removed.
    pub fn clear_all_maps(&self) -> Result<u32> {
        let cleared = self.runtime.block_on(self.maps.clear_all())?;
        Ok(cleared as u32)
    }

    pub fn has_offline_maps(&self) -> Result<bool> {
        self.runtime.block_on(self.maps.has_any())
    }

    /// Total bytes of all downloaded maps.
    pub fn total_storage_used(&self) -> Result<u64> {
        self.runtime.block_on(self.maps.total_bytes())
    }

    pub fn downloaded_map_names(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.maps.names())
    }

    pub fn map_tile_url(&self, map_id: String) -> Result<Option<String>> {
        self.runtime.block_on(self.maps.tile_url(&map_id))
    }
}

// ============================================================================
// Geo Helpers
// ============================================================================

/// Great-circle distance between two points in kilometers.
#[uniffi::export]
pub fn ffi_haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    geo_utils::haversine_km(lat1, lon1, lat2, lon2)
}

/// Padded map region containing every point.
#[uniffi::export]
pub fn ffi_region_for_coordinates(points: Vec<Coordinate>) -> Region {
    geo_utils::region_for_coordinates(&points)
}

/// Address text used for a stop added without one.
#[uniffi::export]
pub fn ffi_format_coordinate_address(latitude: f64, longitude: f64) -> String {
    geo_utils::format_coordinate_address(latitude, longitude)
}

/// Region downloaded by `download_map`.
#[uniffi::export]
pub fn ffi_default_offline_region() -> Region {
    crate::offline_maps::default_region()
}
