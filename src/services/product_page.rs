//! Canonical product page source.
//!
//! The page's embedded dataset is the authority for name, price, sku,
//! image and variant inventory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SourceFragment;
use crate::services::extract::{self, PAGE_STRATEGIES};
use crate::services::{ProductSource, SourceLookup, contain};
use crate::utils::Fetch;

/// Fetches a product page and extracts its embedded product.
pub struct ProductPageSource {
    fetcher: Arc<dyn Fetch>,
}

impl ProductPageSource {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<SourceFragment>> {
        let page = self.fetcher.get(url).await?;

        Ok(extract::apply(PAGE_STRATEGIES, &page.body).map(|(strategy, mut fragment)| {
            log::debug!("{}: matched {} at {}", self.name(), strategy, url);
            fragment.url = Some(url.to_string());
            fragment
        }))
    }
}

#[async_trait]
impl ProductSource for ProductPageSource {
    fn name(&self) -> &'static str {
        "product_page"
    }

    async fn fetch(&self, lookup: &SourceLookup) -> Option<SourceFragment> {
        let SourceLookup::Url(url) = lookup else {
            return None;
        };

        contain(self.name(), self.try_fetch(url).await)
    }
}
