//! Diff calculation for restock notifications.
//!
//! Compares a freshly resolved product with its stored record and produces
//! the updated record plus the events to alert on.

use chrono::{DateTime, Utc};

use crate::models::{CanonicalProduct, ProductEvent, TrackedRecord, Variant, VariantHistory};

/// Result of merging one product into the store.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The record as stored after the merge
    pub record: TrackedRecord,
    /// Events for the alerter, in variant order
    pub events: Vec<ProductEvent>,
    /// Whether the record was created by this upsert
    pub created: bool,
}

impl UpsertOutcome {
    /// Check if there are any events to dispatch.
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Number of restock events.
    pub fn restock_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ProductEvent::Restock { .. }))
            .count()
    }
}

/// Merge `product` into `existing` at time `now`.
pub fn apply(
    existing: Option<&TrackedRecord>,
    product: CanonicalProduct,
    now: DateTime<Utc>,
) -> UpsertOutcome {
    match existing {
        None => create(product, now),
        Some(record) => update(record, product, now),
    }
}

fn create(product: CanonicalProduct, now: DateTime<Utc>) -> UpsertOutcome {
    let history = product
        .variants
        .iter()
        .map(|v| (v.variant_id.clone(), VariantHistory::first_sighting(v, now)))
        .collect();

    let event = ProductEvent::NewProduct {
        product_id: product.product_id.clone(),
        name: product.name.clone(),
        url: product.url.clone(),
    };

    UpsertOutcome {
        record: TrackedRecord {
            product,
            first_seen: now,
            last_seen: now,
            history,
        },
        events: vec![event],
        created: true,
    }
}

fn update(existing: &TrackedRecord, mut product: CanonicalProduct, now: DateTime<Utc>) -> UpsertOutcome {
    let mut record = existing.clone();
    record.last_seen = record.last_seen.max(now);

    let mut events = Vec::new();
    for variant in &product.variants {
        match record.history.get_mut(&variant.variant_id) {
            None => {
                record
                    .history
                    .insert(variant.variant_id.clone(), VariantHistory::first_sighting(variant, now));
            }
            Some(history) => {
                if is_restock(history, variant) {
                    events.push(ProductEvent::Restock {
                        product_id: product.product_id.clone(),
                        name: product.name.clone(),
                        url: product.url.clone(),
                        variant_id: variant.variant_id.clone(),
                        sku: variant.sku.clone(),
                        inventory: variant.inventory,
                    });
                }
                observe(history, variant, now);
            }
        }
    }

    // Aux ids come from best-effort sources; keep the last known one.
    if product.search_id.is_none() {
        product.search_id = record.product.search_id.take();
    }
    if product.storefront_id.is_none() {
        product.storefront_id = record.product.storefront_id.take();
    }
    record.product = product;

    UpsertOutcome {
        record,
        events,
        created: false,
    }
}

fn is_restock(history: &VariantHistory, fresh: &Variant) -> bool {
    history.previous_inventory == 0 && fresh.inventory > 0
}

fn observe(history: &mut VariantHistory, fresh: &Variant, now: DateTime<Utc>) {
    if fresh.inventory > 0 {
        history.first_seen_available.get_or_insert(now);
        history.last_seen_available = Some(history.last_seen_available.map_or(now, |t| t.max(now)));
    }
    history.previous_inventory = fresh.inventory;
    history.sku = fresh.sku.clone();
}
