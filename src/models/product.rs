//! Product data structures.

use serde::{Deserialize, Serialize};

/// The merged, authoritative record for one storefront product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalProduct {
    /// Numeric product id, digits only; the store key
    pub product_id: String,

    /// Display name
    pub name: String,

    /// Product-level SKU (empty when the page has none)
    pub sku: String,

    /// Current price
    pub price: f64,

    /// Primary image URL
    pub image: String,

    /// Canonical product page URL
    pub url: String,

    /// Add-to-cart URL derived from the product id
    pub cart_url: String,

    /// Stable hash of the product id
    pub hashed_id: String,

    /// Id assigned by the search index, if it matched
    #[serde(default)]
    pub search_id: Option<String>,

    /// Id found in the storefront's alternate data blob, if any
    #[serde(default)]
    pub storefront_id: Option<String>,

    /// Purchasable variants in page order
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl CanonicalProduct {
    /// Returns `true` if at least one variant has stock.
    pub fn has_available_variants(&self) -> bool {
        self.variants.iter().any(|v| v.available)
    }
}

/// A purchasable option of a product (size, color, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    /// Variant id, unique within its product
    pub variant_id: String,

    pub sku: String,

    /// Units available to sell
    pub inventory: u64,

    /// Derived: `inventory > 0`
    pub available: bool,
}

impl Variant {
    /// Create a variant, deriving availability from the inventory count.
    pub fn new(variant_id: impl Into<String>, sku: impl Into<String>, inventory: u64) -> Self {
        Self {
            variant_id: variant_id.into(),
            sku: sku.into(),
            inventory,
            available: inventory > 0,
        }
    }
}

/// A partial product record contributed by one source.
///
/// Every field is optional; a source fills in what it found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFragment {
    pub product_id: Option<String>,
    /// Source-specific id (search-index id, storefront graph id)
    pub aux_id: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub variants: Option<Vec<Variant>>,
}

impl SourceFragment {
    /// Whether the fragment carries nothing at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Stable hashed identifier for a numeric product id (lowercase hex MD5).
pub fn hashed_id(product_id: &str) -> String {
    format!("{:x}", md5::compute(product_id.as_bytes()))
}
