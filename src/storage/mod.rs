//! Storage abstractions for tracked products.
//!
//! The store keeps every tracked record in memory and mirrors the whole map
//! to a snapshot backend after each upsert.
//!
//! ## Snapshot Layout
//!
//! ```text
//! {
//!   "12345": { "product": {...}, "first_seen": "...", "last_seen": "...", "history": {...} },
//!   "67890": { ... }
//! }
//! ```

pub mod local;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{CanonicalProduct, TrackedRecord};
use crate::pipeline::diff::{self, UpsertOutcome};

// Re-export for convenience
pub use local::LocalStorage;

/// Numeric product id → tracked record.
pub type RecordMap = BTreeMap<String, TrackedRecord>;

/// Whole-snapshot persistence backend.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Read the persisted map. `None` when nothing was saved yet; an
    /// unreadable snapshot is an error.
    async fn load(&self) -> Result<Option<RecordMap>>;

    /// Overwrite the persisted map.
    async fn save(&self, records: &RecordMap) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Keyed store of tracked records.
pub struct ProductStore {
    records: Mutex<RecordMap>,
    backend: Arc<dyn SnapshotStorage>,
}

impl ProductStore {
    /// Load the persisted snapshot, or start empty if there is none.
    pub async fn open(backend: Arc<dyn SnapshotStorage>) -> Result<Self> {
        let records = backend.load().await?.unwrap_or_default();
        log::info!(
            "Loaded {} tracked products from {}",
            records.len(),
            backend.location()
        );

        Ok(Self {
            records: Mutex::new(records),
            backend,
        })
    }

    pub async fn get(&self, product_id: &str) -> Option<TrackedRecord> {
        self.records.lock().await.get(product_id).cloned()
    }

    /// Copy of every record, ordered by product id.
    pub async fn list(&self) -> Vec<TrackedRecord> {
        self.records.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Product id whose hashed id equals `hashed_id`.
    pub async fn find_by_hash(&self, hashed_id: &str) -> Option<String> {
        self.records
            .lock()
            .await
            .values()
            .find(|r| r.product.hashed_id.eq_ignore_ascii_case(hashed_id))
            .map(|r| r.product_id().to_string())
    }

    /// Merge a freshly resolved product into the store and persist.
    ///
    /// Upserts are serialized; each one computes its diff and writes its
    /// snapshot before the next begins. A failed write is logged and the
    /// in-memory state and events stand.
    pub async fn upsert(&self, product: CanonicalProduct, now: DateTime<Utc>) -> UpsertOutcome {
        let mut records = self.records.lock().await;

        let outcome = diff::apply(records.get(&product.product_id), product, now);
        records.insert(outcome.record.product_id().to_string(), outcome.record.clone());

        if let Err(error) = self.backend.save(&records).await {
            log::error!(
                "Failed to write snapshot to {}: {}",
                self.backend.location(),
                error
            );
        }

        outcome
    }
}
