//! Runtime configuration for the Pathway stores.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "pathway.db";

/// Default offline map root inside the data directory.
pub const DEFAULT_OFFLINE_MAPS_DIR: &str = "offline_maps";

/// Key under which the settings bundle is persisted.
pub const DEFAULT_SETTINGS_KEY: &str = "pathway_settings";

/// Configuration for opening the Pathway stores.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayConfig {
    /// Root directory for all persisted state.
    /// Default: current directory
    pub data_dir: PathBuf,

    /// SQLite database file name, relative to `data_dir`.
    /// Default: "pathway.db"
    pub database_file: String,

    /// Offline map root directory name, relative to `data_dir`.
    /// Default: "offline_maps"
    pub offline_maps_dir: String,

    /// Key of the settings bundle in the key-value store.
    /// Default: "pathway_settings"
    pub settings_key: String,

    /// Simulated download time for an offline map region.
    /// Default: 2 seconds
    pub download_delay: Duration,

    /// Zoom level used when a download does not specify one.
    /// Default: 12
    pub default_zoom_level: u8,
}

impl Default for PathwayConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            offline_maps_dir: DEFAULT_OFFLINE_MAPS_DIR.to_string(),
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            download_delay: Duration::from_secs(2),
            default_zoom_level: 12,
        }
    }
}

impl PathwayConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Override the simulated download delay.
    pub fn download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    /// Full path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Full path of the offline map root directory.
    pub fn offline_maps_path(&self) -> PathBuf {
        self.data_dir.join(&self.offline_maps_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = PathwayConfig::with_data_dir("/data/app");
        assert_eq!(config.database_path(), PathBuf::from("/data/app/pathway.db"));
        assert_eq!(
            config.offline_maps_path(),
            PathBuf::from("/data/app/offline_maps")
        );
        assert_eq!(config.settings_key, "pathway_settings");
        assert_eq!(config.download_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_download_delay_override() {
        let config = PathwayConfig::default().download_delay(Duration::ZERO);
        assert_eq!(config.download_delay, Duration::ZERO);
        assert_eq!(config.default_zoom_level, 12);
    }
}
