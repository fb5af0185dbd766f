//! Service layer for the tracker.
//!
//! This module contains the upstream product sources and the alert sink:
//! - Search index lookup (`SearchIndexSource`)
//! - Canonical product page extraction (`ProductPageSource`)
//! - Storefront alternate-blob extraction (`StorefrontSource`)
//! - Alert delivery (`Notifier`)

pub mod extract;
mod notify;
mod product_page;
mod search;
mod storefront;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::SourceFragment;

pub use notify::{LogNotifier, Notifier, WebhookNotifier, notifier_from_config};
pub use product_page::ProductPageSource;
pub use search::SearchIndexSource;
pub use storefront::StorefrontSource;

/// What a source is asked to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLookup {
    /// Free-text search term
    Query(String),
    /// Known numeric product id
    ProductId(String),
    /// Resolved page URL
    Url(String),
}

/// An independent upstream source of partial product data.
///
/// Sources never fail: a network error, bad payload or miss is logged and
/// reported as `None`, and the resolver carries on without that source.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Look up a fragment. Lookups a source cannot serve return `None`.
    async fn fetch(&self, lookup: &SourceLookup) -> Option<SourceFragment>;
}

/// Collapse a fallible source call into the never-failing contract.
pub(crate) fn contain(
    source_name: &'static str,
    result: Result<Option<SourceFragment>>,
) -> Option<SourceFragment> {
    match result {
        Ok(Some(fragment)) if !fragment.is_empty() => Some(fragment),
        Ok(_) => {
            log::debug!("{}: no match", source_name);
            None
        }
        Err(error) => {
            log::warn!("{}", AppError::source_unavailable(source_name, error));
            None
        }
    }
}
