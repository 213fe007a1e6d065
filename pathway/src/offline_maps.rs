//! # Offline Map Registry
//!
//! Named map region "downloads" kept on disk, one directory per map:
//!
//! ```text
//! offline_maps/
//!   map_1717236000000/
//!     mock_tile.png    placeholder payload
//!     metadata.json    OfflineMap, camelCase
//! ```
//!
//! No tiles are fetched. A download writes a placeholder payload, waits the
//! configured delay and then writes the metadata; a map without readable
//! metadata is not listed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::fs;

use crate::config::PathwayConfig;
use crate::error::{OptionExt, PathwayError, Result};
use crate::persistence::current_timestamp_iso;
use crate::types::{OfflineMap, Region};

/// Placeholder payload file inside a map directory.
pub const PAYLOAD_FILE: &str = "mock_tile.png";

/// Metadata file inside a map directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Prefix of generated map ids.
pub const MAP_ID_PREFIX: &str = "map_";

/// Region used by [`OfflineMapRegistry::download_default`] (Istanbul).
pub fn default_region() -> Region {
    Region::new(41.0082, 28.9784, 0.1, 0.1)
}

/// Placeholder payload written for a map called `name`.
pub fn placeholder_payload(name: &str) -> String {
    format!("Mock tile data for {}", name)
}

/// Offline maps stored under a single root directory.
#[derive(Debug, Clone)]
pub struct OfflineMapRegistry {
    root: PathBuf,
    download_delay: Duration,
    default_zoom_level: u8,
}

impl OfflineMapRegistry {
    pub fn new(root: impl AsRef<Path>, download_delay: Duration, default_zoom_level: u8) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            download_delay,
            default_zoom_level,
        }
    }

    pub fn from_config(config: &PathwayConfig) -> Self {
        Self::new(
            config.offline_maps_path(),
            config.download_delay,
            config.default_zoom_level,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if needed. Every other operation calls this
    /// first, so explicit initialization is optional.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn map_dir(&self, map_id: &str) -> Result<PathBuf> {
        if map_id.is_empty() || map_id.contains(['/', '\\']) || map_id == "." || map_id == ".." {
            return Err(PathwayError::invalid(
                "map_id",
                format!("'{}' is not a valid map id", map_id),
            ));
        }
        Ok(self.root.join(map_id))
    }

    /// Reserve a fresh `map_<millis>` directory. Taken ids move to the next
    /// millisecond.
    async fn allocate_map_dir(&self) -> Result<(String, PathBuf)> {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let map_id = format!("{}{}", MAP_ID_PREFIX, millis);
            let dir = self.root.join(&map_id);
            match fs::create_dir(&dir).await {
                Ok(()) => return Ok((map_id, dir)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// Download `region` under `name` and return the new map id.
    ///
    /// `zoom_level` defaults to the configured level. A failed download
    /// removes its partial directory.
    pub async fn download_region(
        &self,
        region: Region,
        name: &str,
        zoom_level: Option<u8>,
    ) -> Result<String> {
        if name.trim().is_empty() {
            return Err(PathwayError::invalid("name", "must not be empty"));
        }
        region.check()?;
        self.init().await?;

        let (map_id, dir) = self.allocate_map_dir().await?;
        let zoom = zoom_level.unwrap_or(self.default_zoom_level);
        log::info!(
            "[OfflineMaps] Starting download for '{}' as {} (zoom {})",
            name,
            map_id,
            zoom
        );

        match self.write_map(&map_id, &dir, region, name).await {
            Ok(map) => {
                log::info!(
                    "[OfflineMaps] Download completed for '{}' ({} bytes)",
                    map.name,
                    map.file_size
                );
                Ok(map_id)
            }
            Err(e) => {
                log::warn!("[OfflineMaps] Download of '{}' failed: {}", name, e);
                if let Err(cleanup) = fs::remove_dir_all(&dir).await {
                    log::warn!("[OfflineMaps] Could not remove {}: {}", dir.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    async fn write_map(
        &self,
        map_id: &str,
        dir: &Path,
        region: Region,
        name: &str,
    ) -> Result<OfflineMap> {
        let payload = placeholder_payload(name);
        fs::write(dir.join(PAYLOAD_FILE), &payload).await?;

        if !self.download_delay.is_zero() {
            tokio::time::sleep(self.download_delay).await;
        }

        let map = OfflineMap {
            id: map_id.to_string(),
            name: name.to_string(),
            region,
            downloaded_at: current_timestamp_iso(),
            file_size: payload.len() as u64,
        };
        fs::write(dir.join(METADATA_FILE), serde_json::to_vec(&map)?).await?;
        Ok(map)
    }

    /// Download the default region under `name`.
    pub async fn download_default(&self, name: &str) -> Result<String> {
        self.download_region(default_region(), name, None).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every map with readable metadata, oldest download first.
    pub async fn list(&self) -> Result<Vec<OfflineMap>> {
        self.init().await?;

        let mut maps = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let metadata_path = entry.path().join(METADATA_FILE);
            match read_metadata(&metadata_path).await {
                Ok(map) => maps.push(map),
                Err(e) => log::warn!(
                    "[OfflineMaps] Skipping {}: {}",
                    entry.file_name().to_string_lossy(),
                    e
                ),
            }
        }

        maps.sort_by(|a, b| {
            a.downloaded_at
                .cmp(&b.downloaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(maps)
    }

    /// Single map by id, `None` if absent or unreadable.
    pub async fn get(&self, map_id: &str) -> Result<Option<OfflineMap>> {
        let path = self.map_dir(map_id)?.join(METADATA_FILE);
        match read_metadata(&path).await {
            Ok(map) => Ok(Some(map)),
            Err(PathwayError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                log::warn!("[OfflineMaps] Unreadable metadata for {}: {}", map_id, e);
                Ok(None)
            }
        }
    }

    pub async fn has_any(&self) -> Result<bool> {
        Ok(!self.list().await?.is_empty())
    }

    /// Sum of `file_size` over all listed maps.
    pub async fn total_bytes(&self) -> Result<u64> {
        Ok(self.list().await?.iter().map(|m| m.file_size).sum())
    }

    pub async fn names(&self) -> Result<Vec<String>> {
        Ok(self.list().await?.into_iter().map(|m| m.name).collect())
    }

    /// `file://` URL of a map's payload, `None` if the map has none.
    pub async fn tile_url(&self, map_id: &str) -> Result<Option<String>> {
        let path = self.map_dir(map_id)?.join(PAYLOAD_FILE);
        if fs::try_exists(&path).await? {
            Ok(Some(format!("file://{}", path.display())))
        } else {
            Ok(None)
        }
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Remove a map directory. Returns false if no such map exists.
    pub async fn delete_by_id(&self, map_id: &str) -> Result<bool> {
        let dir = self.map_dir(map_id)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                log::info!("[OfflineMaps] Deleted {}", map_id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the first listed map called `name`.
    pub async fn delete_by_name(&self, name: &str) -> Result<()> {
        let map = self
            .list()
            .await?
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_map_not_found(name)?;
        self.delete_by_id(&map.id).await?;
        Ok(())
    }

    /// Remove every listed map, one at a time. Stops at the first failure.
    pub async fn clear_all(&self) -> Result<usize> {
        let maps = self.list().await?;
        for map in &maps {
            self.delete_by_id(&map.id).await?;
        }
        log::info!("[OfflineMaps] Cleared {} maps", maps.len());
        Ok(maps.len())
    }
}

async fn read_metadata(path: &Path) -> Result<OfflineMap> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> OfflineMapRegistry {
        OfflineMapRegistry::new(dir.path().join("offline_maps"), Duration::ZERO, 12)
    }

    #[tokio::test]
    async fn test_download_writes_payload_and_metadata() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);

        let id = maps.download_default("Istanbul").await.unwrap();
        assert!(id.starts_with(MAP_ID_PREFIX));

        let map_dir = maps.root().join(&id);
        let payload = std::fs::read_to_string(map_dir.join(PAYLOAD_FILE)).unwrap();
        assert_eq!(payload, "Mock tile data for Istanbul");

        let raw = std::fs::read_to_string(map_dir.join(METADATA_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["fileSize"], payload.len() as u64);
        assert_eq!(json["region"]["latitude"], 41.0082);
        assert!(json["downloadedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);

        maps.download_region(default_region(), "Istanbul", Some(14))
            .await
            .unwrap();

        let listed = maps.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Istanbul");
        assert_eq!(
            listed[0].file_size,
            placeholder_payload("Istanbul").len() as u64
        );

        maps.delete_by_name("Istanbul").await.unwrap();
        assert!(maps.list().await.unwrap().is_empty());
        assert!(!maps.has_any().await.unwrap());
    }

    #[tokio::test]
    async fn test_ids_unique_and_listing_ordered() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);

        let a = maps.download_default("A").await.unwrap();
        let b = maps.download_default("B").await.unwrap();
        let c = maps.download_default("C").await.unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);

        assert_eq!(maps.names().await.unwrap(), vec!["A", "B", "C"]);
        let expected: u64 = ["A", "B", "C"]
            .iter()
            .map(|n| placeholder_payload(n).len() as u64)
            .sum();
        assert_eq!(maps.total_bytes().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_corrupt_metadata_skipped() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);
        maps.download_default("Good").await.unwrap();

        let broken = maps.root().join("map_1");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join(METADATA_FILE), "{oops").unwrap();
        // Directory without metadata at all
        std::fs::create_dir_all(maps.root().join("map_2")).unwrap();
        // Stray file at the root
        std::fs::write(maps.root().join("notes.txt"), "x").unwrap();

        assert_eq!(maps.names().await.unwrap(), vec!["Good"]);
        assert!(maps.get("map_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);

        assert!(!maps.delete_by_id("map_404").await.unwrap());
        assert!(matches!(
            maps.delete_by_name("Nowhere").await,
            Err(PathwayError::MapNotFound(ref name)) if name == "Nowhere"
        ));
    }

    #[tokio::test]
    async fn test_clear_all() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);

        assert_eq!(maps.clear_all().await.unwrap(), 0);

        maps.download_default("One").await.unwrap();
        maps.download_default("Two").await.unwrap();
        assert_eq!(maps.clear_all().await.unwrap(), 2);
        assert!(!maps.has_any().await.unwrap());
    }

    #[tokio::test]
    async fn test_tile_url() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);
        let id = maps.download_default("Istanbul").await.unwrap();

        let url = maps.tile_url(&id).await.unwrap().unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with(PAYLOAD_FILE));

        assert_eq!(maps.tile_url("map_0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);

        for id in ["", "..", "../etc", "a/b"] {
            assert!(matches!(
                maps.delete_by_id(id).await,
                Err(PathwayError::InvalidInput { field: "map_id", .. })
            ));
        }
        assert!(maps.download_default("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_region_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let maps = registry(&dir);
        maps.init().await.unwrap();

        for region in [
            Region::new(f64::INFINITY, 0.0, 0.1, 0.1),
            Region::new(41.0, 28.9, f64::NAN, 0.1),
        ] {
            assert!(matches!(
                maps.download_region(region, "Broken", None).await,
                Err(PathwayError::InvalidInput { field: "region", .. })
            ));
        }

        assert_eq!(std::fs::read_dir(maps.root()).unwrap().count(), 0);
        assert_eq!(maps.clear_all().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_waits_for_delay() {
        let dir = TempDir::new().unwrap();
        let maps = OfflineMapRegistry::new(dir.path(), Duration::from_secs(2), 12);

        let started = tokio::time::Instant::now();
        maps.download_default("Slow").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
