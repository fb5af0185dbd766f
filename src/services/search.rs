//! Search index source.
//!
//! Resolves a free-text query or numeric id to the best-matching hit of the
//! storefront's hosted search index.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{SiteConfig, SourceFragment};
use crate::services::extract::{json_f64, json_string};
use crate::services::{ProductSource, SourceLookup, contain};
use crate::utils::Fetch;
use crate::utils::url::resolve;

/// Search API response; only the hit list is used.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One search hit. Every field is optional and loosely typed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    uid: Option<Value>,
    id: Option<Value>,
    url: Option<Value>,
    name: Option<Value>,
    price: Option<Value>,
    sku: Option<Value>,
    image_url: Option<Value>,
    thumbnail_image_url: Option<Value>,
}

/// Looks products up in the hosted search index.
pub struct SearchIndexSource {
    fetcher: Arc<dyn Fetch>,
    site: SiteConfig,
}

impl SearchIndexSource {
    pub fn new(fetcher: Arc<dyn Fetch>, site: SiteConfig) -> Self {
        Self { fetcher, site }
    }

    /// Search request URL for `query`.
    pub fn search_url(&self, query: &str) -> Result<String> {
        let url = url::Url::parse_with_params(
            &self.site.search_url,
            &[
                ("siteId", self.site.search_site_id.as_str()),
                ("q", query),
                ("resultsFormat", "native"),
            ],
        )?;
        Ok(url.to_string())
    }

    async fn try_fetch(&self, query: &str) -> Result<Option<SourceFragment>> {
        let url = self.search_url(query)?;
        let page = self.fetcher.get(&url).await?;
        parse_search_response(&page.body, self.site.base())
    }
}

#[async_trait]
impl ProductSource for SearchIndexSource {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn fetch(&self, lookup: &SourceLookup) -> Option<SourceFragment> {
        let query = match lookup {
            SourceLookup::Query(q) | SourceLookup::ProductId(q) => q.trim(),
            SourceLookup::Url(_) => return None,
        };
        if query.is_empty() {
            return None;
        }

        contain(self.name(), self.try_fetch(query).await)
    }
}

/// First hit as a fragment; relative hit URLs resolve against `base`.
fn parse_search_response(body: &str, base: &str) -> Result<Option<SourceFragment>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let Some(hit) = response.results.into_iter().next() else {
        return Ok(None);
    };

    let text = |v: &Option<Value>| v.as_ref().and_then(json_string);

    Ok(Some(SourceFragment {
        product_id: text(&hit.uid).filter(|id| id.chars().all(|c| c.is_ascii_digit())),
        aux_id: text(&hit.id),
        url: text(&hit.url).map(|href| resolve(base, &href)),
        name: text(&hit.name),
        price: hit.price.as_ref().and_then(json_f64),
        sku: text(&hit.sku),
        image: text(&hit.image_url).or_else(|| text(&hit.thumbnail_image_url)),
        variants: None,
    }))
}
