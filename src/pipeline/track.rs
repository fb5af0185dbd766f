//! Tracking facade.
//!
//! Ties the resolver, the product store and the notifier together: every
//! resolved product is upserted and every resulting event is delivered.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{CanonicalProduct, TrackedRecord};
use crate::pipeline::classify::{CandidateIdentifier, CartId};
use crate::pipeline::diff::UpsertOutcome;
use crate::pipeline::resolve::{Lookup, Resolver};
use crate::services::Notifier;
use crate::storage::ProductStore;

/// Resolves, stores and alerts.
pub struct Tracker {
    resolver: Resolver,
    store: ProductStore,
    notifier: Arc<dyn Notifier>,
    max_concurrent: usize,
}

impl Tracker {
    pub fn new(
        resolver: Resolver,
        store: ProductStore,
        notifier: Arc<dyn Notifier>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            resolver,
            store,
            notifier,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    /// Every tracked record, ordered by product id.
    pub async fn list(&self) -> Vec<TrackedRecord> {
        self.store.list().await
    }

    /// Resolve one input without storing it.
    ///
    /// Hashed cart tokens are matched against the ids already tracked; an
    /// unknown token falls back to a search.
    pub async fn resolve_one(&self, input: &str) -> Result<CanonicalProduct> {
        let candidate = self.resolver.classify(input);

        let lookup = match &candidate {
            CandidateIdentifier::Cart(CartId::Hashed(token)) => {
                match self.store.find_by_hash(token).await {
                    Some(product_id) => {
                        log::debug!("Hashed cart id {} is product {}", token, product_id);
                        Lookup {
                            input: input.to_string(),
                            product_id: Some(product_id),
                            ..Lookup::default()
                        }
                    }
                    None => Lookup::from_candidate(input, &candidate),
                }
            }
            _ => Lookup::from_candidate(input, &candidate),
        };

        self.resolver.resolve_lookup(&lookup).await
    }

    /// Resolve one input and merge it into the store.
    pub async fn track(&self, input: &str) -> Result<UpsertOutcome> {
        let product = self.resolve_one(input).await?;
        Ok(self.commit(product).await)
    }

    /// Resolve and store a batch of inputs.
    ///
    /// Results keep input order. Inputs that fail are logged and left out.
    pub async fn resolve_all(&self, inputs: &[String]) -> Vec<CanonicalProduct> {
        let mut results = stream::iter(inputs)
            .map(|input| async move { (input, self.track(input).await) })
            .buffered(self.max_concurrent);

        let mut products = Vec::with_capacity(inputs.len());
        while let Some((input, result)) = results.next().await {
            match result {
                Ok(outcome) => products.push(outcome.record.product),
                Err(error) => log::warn!("Failed to resolve {:?}: {}", input, error),
            }
        }

        log::info!("Resolved {}/{} inputs", products.len(), inputs.len());
        products
    }

    /// Re-resolve a stored product and merge the fresh state.
    pub async fn refresh(&self, record: &TrackedRecord) -> Result<UpsertOutcome> {
        let product = self
            .resolver
            .resolve_lookup(&Lookup::from_record(record))
            .await?;
        Ok(self.commit(product).await)
    }

    /// Upsert and deliver the resulting events.
    async fn commit(&self, product: CanonicalProduct) -> UpsertOutcome {
        let outcome = self.store.upsert(product, Utc::now()).await;

        for event in &outcome.events {
            log::info!("{} ({})", event.subject(), event.product_id());
            self.notifier.notify(&event.subject(), &event.body()).await;
        }

        outcome
    }
}
