//! # Settings Store
//!
//! App preferences persisted as a single JSON bundle under one key of a
//! key-value store. Reads merge the stored bundle over defaults and never
//! fail; writes read, merge and write back the whole bundle.
//!
//! Read-merge-write is not atomic. Two concurrent writers can both read the
//! same bundle and the later write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};
use crate::types::Region;

// ============================================================================
// Key-Value Backend
// ============================================================================

/// String key-value storage the settings bundle is kept in.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, `None` if nothing is stored.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process store, used by tests and hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| PathwayError::Storage("key-value store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(PathwayError::invalid(
                "key",
                format!("'{}' is not a valid storage key", key),
            ));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.item_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.item_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Settings Bundle
// ============================================================================

/// Persisted app preferences. Missing fields read as their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Prefer downloaded map regions over the network
    pub use_offline_mode: bool,
    /// Download the visible region automatically
    pub auto_download_maps: bool,
    /// Region of the most recent offline download
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_downloaded_region: Option<Region>,
}

/// Fields to overwrite in the bundle. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, uniffi::Record)]
pub struct SettingsPatch {
    pub use_offline_mode: Option<bool>,
    pub auto_download_maps: Option<bool>,
    pub last_downloaded_region: Option<Region>,
}

impl AppSettings {
    fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.use_offline_mode {
            self.use_offline_mode = v;
        }
        if let Some(v) = patch.auto_download_maps {
            self.auto_download_maps = v;
        }
        if let Some(region) = patch.last_downloaded_region {
            self.last_downloaded_region = Some(region);
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Reads and writes the settings bundle.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Settings kept in memory only.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryKeyValueStore::new()),
            crate::config::DEFAULT_SETTINGS_KEY,
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored bundle merged over defaults.
    ///
    /// A backend failure or unparseable value is logged and yields defaults.
    pub fn read(&self) -> AppSettings {
        let raw = match self.store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AppSettings::default(),
            Err(e) => {
                log::warn!("[Settings] Failed to load settings: {}", e);
                return AppSettings::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("[Settings] Ignoring unreadable settings: {}", e);
            AppSettings::default()
        })
    }

    /// Merge `patch` into the stored bundle.
    pub fn write(&self, patch: &SettingsPatch) -> Result<AppSettings> {
        if let Some(region) = &patch.last_downloaded_region {
            region.check()?;
        }

        let mut settings = self.read();
        settings.apply(patch);
        self.save(&settings)?;
        Ok(settings)
    }

    fn save(&self, settings: &AppSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.store.set_item(&self.key, &json)?;
        log::debug!("[Settings] Saved {}", json);
        Ok(())
    }

    /// Drop the stored bundle; the next read returns defaults.
    pub fn reset(&self) -> Result<()> {
        self.store.remove_item(&self.key)?;
        log::info!("[Settings] Reset to defaults");
        Ok(())
    }

    pub fn offline_mode(&self) -> bool {
        self.read().use_offline_mode
    }

    pub fn set_offline_mode(&self, enabled: bool) -> Result<()> {
        self.write(&SettingsPatch {
            use_offline_mode: Some(enabled),
            ..Default::default()
        })
        .map(|_| ())
    }

    pub fn auto_download_maps(&self) -> bool {
        self.read().auto_download_maps
    }

    pub fn set_auto_download_maps(&self, enabled: bool) -> Result<()> {
        self.write(&SettingsPatch {
            auto_download_maps: Some(enabled),
            ..Default::default()
        })
        .map(|_| ())
    }

    pub fn last_downloaded_region(&self) -> Option<Region> {
        self.read().last_downloaded_region
    }

    /// Set or, with `None`, forget the last downloaded region.
    pub fn set_last_downloaded_region(&self, region: Option<Region>) -> Result<()> {
        if let Some(region) = &region {
            region.check()?;
        }

        let mut settings = self.read();
        settings.last_downloaded_region = region;
        self.save(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Err(PathwayError::Storage("offline".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(PathwayError::Storage("read-only".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<()> {
            Err(PathwayError::Storage("read-only".to_string()))
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let settings = SettingsStore::in_memory();
        assert_eq!(settings.read(), AppSettings::default());
        assert!(!settings.offline_mode());
        assert!(settings.last_downloaded_region().is_none());
    }

    #[test]
    fn test_partial_write_keeps_defaults() {
        let settings = SettingsStore::in_memory();
        settings
            .write(&SettingsPatch {
                use_offline_mode: Some(true),
                ..Default::default()
            })
            .unwrap();

        let read = settings.read();
        assert!(read.use_offline_mode);
        assert!(!read.auto_download_maps);
        assert!(read.last_downloaded_region.is_none());
    }

    #[test]
    fn test_writes_merge() {
        let settings = SettingsStore::in_memory();
        settings.set_offline_mode(true).unwrap();
        settings.set_auto_download_maps(true).unwrap();
        settings.set_offline_mode(false).unwrap();

        let read = settings.read();
        assert!(!read.use_offline_mode);
        assert!(read.auto_download_maps);
    }

    #[test]
    fn test_stored_json_shape() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let settings = SettingsStore::new(kv.clone(), "pathway_settings");
        settings
            .set_last_downloaded_region(Some(Region::new(41.0082, 28.9784, 0.1, 0.1)))
            .unwrap();

        let raw = kv.get_item("pathway_settings").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["useOfflineMode"], false);
        assert_eq!(json["autoDownloadMaps"], false);
        assert_eq!(json["lastDownloadedRegion"]["latitudeDelta"], 0.1);
    }

    #[test]
    fn test_partial_stored_bundle_merges_over_defaults() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set_item("pathway_settings", r#"{"autoDownloadMaps":true}"#)
            .unwrap();

        let settings = SettingsStore::new(kv, "pathway_settings");
        let read = settings.read();
        assert!(read.auto_download_maps);
        assert!(!read.use_offline_mode);
    }

    #[test]
    fn test_corrupt_value_reads_defaults() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set_item("pathway_settings", "{not json").unwrap();

        let settings = SettingsStore::new(kv, "pathway_settings");
        assert_eq!(settings.read(), AppSettings::default());

        // A write replaces the corrupt value
        settings.set_auto_download_maps(true).unwrap();
        assert!(settings.auto_download_maps());
    }

    #[test]
    fn test_backend_failure() {
        let settings = SettingsStore::new(Arc::new(FailingStore), "pathway_settings");
        assert_eq!(settings.read(), AppSettings::default());
        assert!(matches!(
            settings.set_offline_mode(true),
            Err(PathwayError::Storage(_))
        ));
        assert!(settings.reset().is_err());
    }

    #[test]
    fn test_clear_region_and_reset() {
        let settings = SettingsStore::in_memory();
        let region = Region::new(39.93, 32.85, 0.2, 0.2);
        settings.set_last_downloaded_region(Some(region)).unwrap();
        settings.set_offline_mode(true).unwrap();
        assert_eq!(settings.last_downloaded_region(), Some(region));

        settings.set_last_downloaded_region(None).unwrap();
        assert!(settings.last_downloaded_region().is_none());
        assert!(settings.offline_mode());

        settings.reset().unwrap();
        assert_eq!(settings.read(), AppSettings::default());
    }

    #[test]
    fn test_invalid_region_rejected_before_save() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let settings = SettingsStore::new(kv.clone(), "pathway_settings");
        settings.set_offline_mode(true).unwrap();
        settings.set_auto_download_maps(true).unwrap();
        let stored = kv.get_item("pathway_settings").unwrap();

        let bad = Region::new(f64::NAN, 28.9, 0.1, 0.1);
        assert!(matches!(
            settings.set_last_downloaded_region(Some(bad)),
            Err(PathwayError::InvalidInput { field: "region", .. })
        ));
        assert!(matches!(
            settings.write(&SettingsPatch {
                use_offline_mode: Some(false),
                last_downloaded_region: Some(Region::new(41.0, 28.9, f64::INFINITY, 0.1)),
                ..Default::default()
            }),
            Err(PathwayError::InvalidInput { .. })
        ));

        assert_eq!(kv.get_item("pathway_settings").unwrap(), stored);
        let read = settings.read();
        assert!(read.use_offline_mode);
        assert!(read.auto_download_maps);
        assert!(read.last_downloaded_region.is_none());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let kv = FileKeyValueStore::new(dir.path().join("kv"));

        assert_eq!(kv.get_item("a").unwrap(), None);
        kv.set_item("a", "1").unwrap();
        assert_eq!(kv.get_item("a").unwrap().as_deref(), Some("1"));
        kv.remove_item("a").unwrap();
        kv.remove_item("a").unwrap();
        assert_eq!(kv.get_item("a").unwrap(), None);

        assert!(matches!(
            kv.set_item("../escape", "x"),
            Err(PathwayError::InvalidInput { field: "key", .. })
        ));
    }

    #[test]
    fn test_settings_survive_new_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let open = || {
            SettingsStore::new(
                Arc::new(FileKeyValueStore::new(dir.path())),
                "pathway_settings",
            )
        };

        open().set_auto_download_maps(true).unwrap();
        assert!(open().auto_download_maps());
    }
}
