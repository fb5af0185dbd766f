//! Merging source fragments into one canonical product.
//!
//! Field precedence:
//!
//! | Field            | Order                                   |
//! |------------------|-----------------------------------------|
//! | product id       | page, input id, search, storefront      |
//! | name, sku, image | page, search, storefront                |
//! | price            | page, search, storefront                |
//! | variants         | page, storefront                        |
//! | url              | the resolved canonical URL              |
//! | search id        | search                                  |
//! | storefront id    | storefront                              |

use crate::error::{AppError, Result};
use crate::models::{CanonicalProduct, SiteConfig, SourceFragment, hashed_id};

/// Everything the resolver gathered for one product.
#[derive(Debug, Clone, Default)]
pub struct MergeInputs {
    /// Canonical URL the page was fetched from
    pub url: String,
    /// Numeric id carried by the caller's input
    pub known_product_id: Option<String>,
    pub page: Option<SourceFragment>,
    pub search: Option<SourceFragment>,
    pub storefront: Option<SourceFragment>,
}

impl MergeInputs {
    /// First non-empty value of `field` across `sources`, in order.
    fn first<T>(
        sources: [Option<&SourceFragment>; 3],
        field: impl Fn(&SourceFragment) -> Option<T>,
    ) -> Option<T> {
        sources.into_iter().flatten().find_map(field)
    }

    fn by_page_search_storefront(&self) -> [Option<&SourceFragment>; 3] {
        [
            self.page.as_ref(),
            self.search.as_ref(),
            self.storefront.as_ref(),
        ]
    }
}

/// Combine the fragments into a canonical product.
///
/// Fails with `CanonicalExtractionFailed` when no source yields a numeric
/// product id. Search and storefront fragments naming a different product
/// are discarded once the id is settled.
pub fn merge(mut inputs: MergeInputs, site: &SiteConfig) -> Result<CanonicalProduct> {
    let fragment_id = |f: &Option<SourceFragment>| f.as_ref().and_then(|f| f.product_id.clone());
    let product_id = [
        fragment_id(&inputs.page),
        inputs.known_product_id.clone(),
        fragment_id(&inputs.search),
        fragment_id(&inputs.storefront),
    ]
    .into_iter()
    .flatten()
    .find(|id| is_numeric(id))
    .ok_or_else(|| AppError::CanonicalExtractionFailed {
        url: inputs.url.clone(),
    })?;

    inputs.search = inputs
        .search
        .take()
        .filter(|f| describes(f, &product_id, "search"));
    inputs.storefront = inputs
        .storefront
        .take()
        .filter(|f| describes(f, &product_id, "storefront"));

    let order = inputs.by_page_search_storefront();
    let name = MergeInputs::first(order, |f| non_empty(&f.name)).unwrap_or_default();
    let sku = MergeInputs::first(order, |f| non_empty(&f.sku)).unwrap_or_default();
    let image = MergeInputs::first(order, |f| non_empty(&f.image)).unwrap_or_default();
    let price = MergeInputs::first(order, |f| f.price).unwrap_or_default();

    let variants = MergeInputs::first(
        [inputs.page.as_ref(), inputs.storefront.as_ref(), None],
        |f| f.variants.clone(),
    )
    .unwrap_or_default();

    Ok(CanonicalProduct {
        cart_url: site.cart_url(&product_id),
        hashed_id: hashed_id(&product_id),
        search_id: inputs.search.as_ref().and_then(|f| f.aux_id.clone()),
        storefront_id: inputs.storefront.as_ref().and_then(|f| f.aux_id.clone()),
        product_id,
        name,
        sku,
        price,
        image,
        url: inputs.url,
        variants,
    })
}

/// Pick the URL to fetch the canonical page from.
///
/// The caller's own URL wins, then the search hit, then the storefront.
pub fn pick_canonical_url(
    direct: Option<&str>,
    search: Option<&SourceFragment>,
    storefront: Option<&SourceFragment>,
) -> Option<String> {
    direct
        .map(str::to_string)
        .or_else(|| search.and_then(|f| f.url.clone()))
        .or_else(|| storefront.and_then(|f| f.url.clone()))
}

/// Whether `fragment` is about `product_id`. A fragment without an id is
/// taken at its word.
fn describes(fragment: &SourceFragment, product_id: &str, source_name: &str) -> bool {
    match fragment.product_id.as_deref() {
        Some(id) if id != product_id => {
            log::debug!(
                "Ignoring {} fragment for product {} while merging {}",
                source_name,
                id,
                product_id
            );
            false
        }
        _ => true,
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
