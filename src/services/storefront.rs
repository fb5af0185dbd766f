//! Storefront source.
//!
//! Secondary view of a product, read from whichever alternate data blob the
//! storefront page carries. Contributes the storefront's own product id and,
//! when reached through a numeric id, the product URL.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{SiteConfig, SourceFragment};
use crate::services::extract::{self, STOREFRONT_STRATEGIES};
use crate::services::{ProductSource, SourceLookup, contain};
use crate::utils::Fetch;
use crate::utils::url::resolve;

/// Reads the storefront's alternate embedded data.
pub struct StorefrontSource {
    fetcher: Arc<dyn Fetch>,
    site: SiteConfig,
}

impl StorefrontSource {
    pub fn new(fetcher: Arc<dyn Fetch>, site: SiteConfig) -> Self {
        Self { fetcher, site }
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<SourceFragment>> {
        let page = self.fetcher.get(url).await?;
        let Some((strategy, mut fragment)) = extract::apply(STOREFRONT_STRATEGIES, &page.body)
        else {
            return Ok(None);
        };
        log::debug!("{}: matched {} at {}", self.name(), strategy, url);

        fragment.url = match fragment.url.take() {
            Some(href) => Some(resolve(self.site.base(), &href)),
            // The id lookup redirects to the product page itself.
            None if page.final_url != url => Some(page.final_url),
            None => None,
        };

        Ok(Some(fragment))
    }
}

#[async_trait]
impl ProductSource for StorefrontSource {
    fn name(&self) -> &'static str {
        "storefront"
    }

    async fn fetch(&self, lookup: &SourceLookup) -> Option<SourceFragment> {
        let url = match lookup {
            SourceLookup::ProductId(id) => self.site.product_lookup_url(id),
            SourceLookup::Url(url) => url.clone(),
            SourceLookup::Query(_) => return None,
        };

        contain(self.name(), self.try_fetch(&url).await)
    }
}
