//! Local filesystem storage implementation.
//!
//! Keeps the tracked-product snapshot as a single JSON document. Every save
//! rewrites the whole document through a temp file and a rename.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Tracker Configuration
//! └── db.json               # Tracked products, keyed by numeric id
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{RecordMap, SnapshotStorage};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    file_name: String,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Full path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.root_dir.join(&self.file_name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path();
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::persistence_corrupt(self.location(), e)),
        }
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn load(&self) -> Result<Option<RecordMap>> {
        let Some(bytes) = self.read_bytes().await? else {
            log::warn!("No snapshot at {}, starting empty", self.location());
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::persistence_corrupt(self.location(), e))
    }

    async fn save(&self, records: &RecordMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        self.write_bytes(&bytes).await
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalProduct, TrackedRecord, Variant, VariantHistory};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_records() -> RecordMap {
        let seen = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let variant = Variant::new("1", "BAS3BC-S", 0);
        let record = TrackedRecord {
            product: CanonicalProduct {
                product_id: "12345".into(),
                name: "Bashful Bunny".into(),
                sku: "BAS3BC".into(),
                price: 25.0,
                image: "https://cdn.example.com/bunny.jpg".into(),
                url: "https://us.jellycat.com/bashful-bunny/".into(),
                cart_url: "https://us.jellycat.com/cart.php?action=add&product_id=12345".into(),
                hashed_id: "827ccb0eea8a706c4c34a16891f84e7b".into(),
                search_id: Some("ss-1".into()),
                storefront_id: None,
                variants: vec![variant.clone()],
            },
            first_seen: seen,
            last_seen: seen,
            history: [("1".to_string(), VariantHistory::first_sighting(&variant, seen))]
                .into_iter()
                .collect(),
        };

        [("12345".to_string(), record)].into_iter().collect()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "db.json");

        let records = sample_records();
        storage.save(&records).await.unwrap();

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded, records);
        assert!(!storage.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_keyed_by_product_id() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "db.json");
        storage.save(&sample_records()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(storage.path()).unwrap()).unwrap();
        assert_eq!(raw["12345"]["product"]["name"], "Bashful Bunny");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "nope.json");
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "db.json");
        std::fs::write(storage.path(), b"{\"12345\": {\"product\": ").unwrap();

        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceCorrupt { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested/dir"), "db.json");
        storage.save(&RecordMap::new()).await.unwrap();
        assert!(storage.path().exists());
    }
}
