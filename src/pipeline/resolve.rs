//! Product resolution.
//!
//! Turns one caller input into a canonical product: classify it, ask the
//! search index and the storefront concurrently, settle on a canonical URL,
//! read the product page and merge everything.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{CanonicalProduct, SiteConfig, TrackedRecord};
use crate::pipeline::classify::{CandidateIdentifier, CartId, classify};
use crate::pipeline::merge::{MergeInputs, merge, pick_canonical_url};
use crate::services::{
    ProductPageSource, ProductSource, SearchIndexSource, SourceLookup, StorefrontSource,
};
use crate::utils::Fetch;
use crate::utils::url::{last_segment, parse_lenient};

/// What the resolver knows before asking any source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    /// Raw caller input, for error messages
    pub input: String,
    /// Product page URL given by the caller
    pub direct_url: Option<String>,
    /// Numeric product id given by the caller
    pub product_id: Option<String>,
    /// Free-text search term
    pub query: Option<String>,
}

impl Lookup {
    /// Build the lookup for a classified input.
    pub fn from_candidate(input: &str, candidate: &CandidateIdentifier) -> Self {
        let mut lookup = Self {
            input: input.to_string(),
            ..Self::default()
        };

        match candidate {
            CandidateIdentifier::NumericId(id) | CandidateIdentifier::Cart(CartId::Numeric(id)) => {
                lookup.product_id = Some(id.clone());
            }
            CandidateIdentifier::Cart(CartId::Hashed(token)) => {
                lookup.query = Some(token.clone());
            }
            CandidateIdentifier::ProductUrl(url) => {
                lookup.direct_url = Some(url.clone());
                lookup.query = parse_lenient(url)
                    .as_ref()
                    .and_then(last_segment)
                    .map(|slug| slug.replace('-', " "));
            }
            CandidateIdentifier::Query(query) => {
                lookup.query = Some(query.clone()).filter(|q| !q.trim().is_empty());
            }
        }

        lookup
    }

    /// Lookup for refreshing a stored product.
    pub fn from_record(record: &TrackedRecord) -> Self {
        Self {
            input: record.product.url.clone(),
            direct_url: Some(record.product.url.clone()).filter(|u| !u.is_empty()),
            product_id: Some(record.product_id().to_string()),
            query: None,
        }
    }

    /// What to ask the search index, if anything.
    fn search_lookup(&self) -> Option<SourceLookup> {
        self.product_id
            .clone()
            .map(SourceLookup::ProductId)
            .or_else(|| self.query.clone().map(SourceLookup::Query))
    }

    fn is_empty(&self) -> bool {
        self.direct_url.is_none() && self.product_id.is_none() && self.query.is_none()
    }
}

/// Resolves inputs against the configured sources.
pub struct Resolver {
    site: SiteConfig,
    search: Arc<dyn ProductSource>,
    page: Arc<dyn ProductSource>,
    storefront: Arc<dyn ProductSource>,
}

impl Resolver {
    /// Standard source set over one shared fetcher.
    pub fn new(fetcher: Arc<dyn Fetch>, site: SiteConfig) -> Self {
        Self::with_sources(
            site.clone(),
            Arc::new(SearchIndexSource::new(Arc::clone(&fetcher), site.clone())),
            Arc::new(ProductPageSource::new(Arc::clone(&fetcher))),
            Arc::new(StorefrontSource::new(fetcher, site)),
        )
    }

    pub fn with_sources(
        site: SiteConfig,
        search: Arc<dyn ProductSource>,
        page: Arc<dyn ProductSource>,
        storefront: Arc<dyn ProductSource>,
    ) -> Self {
        Self {
            site,
            search,
            page,
            storefront,
        }
    }

    /// Classify `input` against the configured storefront domain.
    pub fn classify(&self, input: &str) -> CandidateIdentifier {
        classify(input, &self.site.domain)
    }

    /// Resolve one raw input.
    pub async fn resolve(&self, input: &str) -> Result<CanonicalProduct> {
        let candidate = self.classify(input);
        log::debug!("Classified {:?} as {:?}", input, candidate);
        self.resolve_lookup(&Lookup::from_candidate(input, &candidate))
            .await
    }

    /// Resolve from an already-built lookup.
    pub async fn resolve_lookup(&self, lookup: &Lookup) -> Result<CanonicalProduct> {
        if lookup.is_empty() {
            return Err(AppError::UnresolvableUrl {
                input: lookup.input.clone(),
            });
        }

        let search_lookup = lookup.search_lookup();
        let storefront_lookup = lookup.product_id.clone().map(SourceLookup::ProductId);

        let (search, storefront) = tokio::join!(
            async {
                match &search_lookup {
                    Some(l) => self.search.fetch(l).await,
                    None => None,
                }
            },
            async {
                match &storefront_lookup {
                    Some(l) => self.storefront.fetch(l).await,
                    None => None,
                }
            }
        );

        let url = pick_canonical_url(
            lookup.direct_url.as_deref(),
            search.as_ref(),
            storefront.as_ref(),
        )
        .ok_or_else(|| AppError::UnresolvableUrl {
            input: lookup.input.clone(),
        })?;

        let page = self
            .page
            .fetch(&SourceLookup::Url(url.clone()))
            .await
            .ok_or_else(|| AppError::CanonicalExtractionFailed { url: url.clone() })?;

        let product = merge(
            MergeInputs {
                url,
                known_product_id: lookup.product_id.clone(),
                page: Some(page),
                search,
                storefront,
            },
            &self.site,
        )?;

        log::debug!(
            "Resolved {:?} to {} ({} variants)",
            lookup.input,
            product.product_id,
            product.variants.len()
        );
        Ok(product)
    }
}
