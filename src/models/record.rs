//! Tracked record: a canonical product plus its sighting history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::{CanonicalProduct, Variant};

/// Stored state for one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedRecord {
    pub product: CanonicalProduct,

    /// Set on creation, never changed
    pub first_seen: DateTime<Utc>,

    /// Latest successful resolution; never moves backwards
    pub last_seen: DateTime<Utc>,

    /// History for every variant ever observed, keyed by variant id
    #[serde(default)]
    pub history: BTreeMap<String, VariantHistory>,
}

impl TrackedRecord {
    /// Numeric product id (store key).
    pub fn product_id(&self) -> &str {
        &self.product.product_id
    }
}

/// Availability history for a single variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantHistory {
    pub sku: String,

    /// First observation with stock; set once
    pub first_seen_available: Option<DateTime<Utc>>,

    /// Latest observation with stock
    pub last_seen_available: Option<DateTime<Utc>>,

    /// Quantity seen on the last fetch
    pub previous_inventory: u64,
}

impl VariantHistory {
    /// History for a variant seen for the first time.
    pub fn first_sighting(variant: &Variant, now: DateTime<Utc>) -> Self {
        let stamp = (variant.inventory > 0).then_some(now);
        Self {
            sku: variant.sku.clone(),
            first_seen_available: stamp,
            last_seen_available: stamp,
            previous_inventory: variant.inventory,
        }
    }
}
