// src/pipeline/classify.rs

//! Identifier classification.
//!
//! Turns an arbitrary caller string into the identifier shape the resolver
//! should start from. Classification never fails: anything unrecognized is
//! passed through as a free-text search query.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::url::{host_matches, parse_lenient};

static CART_PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]product_id=([^&#\s]+)").expect("valid regex"));

static PATH_PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/products/(\d+)(?:[/?#]|$)").expect("valid regex"));

/// The shape an input was recognized as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateIdentifier {
    /// Bare numeric product id, or one embedded in a `/products/<id>/` path.
    NumericId(String),
    /// Add-to-cart link.
    Cart(CartId),
    /// Direct link to a product page on the storefront.
    ProductUrl(String),
    /// Nothing recognizable; used as a search term.
    Query(String),
}

/// Product reference carried by a cart link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartId {
    Numeric(String),
    /// Opaque token, typically the hashed product id.
    Hashed(String),
}

impl CandidateIdentifier {
    /// Numeric product id, when the input carried one.
    pub fn numeric_id(&self) -> Option<&str> {
        match self {
            Self::NumericId(id) | Self::Cart(CartId::Numeric(id)) => Some(id),
            _ => None,
        }
    }
}

/// Classify `input`, treating URLs on `domain` as direct product links.
///
/// Precedence: all-digit input, then a cart link with a numeric id, then a
/// path-embedded numeric id, then a cart link with an opaque id, then a
/// storefront URL, then free text.
pub fn classify(input: &str, domain: &str) -> CandidateIdentifier {
    let trimmed = input.trim();

    if is_numeric(trimmed) {
        return CandidateIdentifier::NumericId(trimmed.to_string());
    }

    let cart_id = cart_product_id(trimmed);
    if let Some(id) = cart_id.as_ref().filter(|id| is_numeric(id)) {
        return CandidateIdentifier::Cart(CartId::Numeric(id.clone()));
    }

    if let Some(id) = path_product_id(trimmed) {
        return CandidateIdentifier::NumericId(id);
    }

    if let Some(token) = cart_id {
        return CandidateIdentifier::Cart(CartId::Hashed(token));
    }

    if let Some(url) = storefront_url(trimmed, domain) {
        return CandidateIdentifier::ProductUrl(url);
    }

    log::debug!("Unclassified input, using as search query: {:?}", trimmed);
    CandidateIdentifier::Query(trimmed.to_string())
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// `product_id` value of a `cart.php` link.
fn cart_product_id(input: &str) -> Option<String> {
    if !input.contains("cart.php") {
        return None;
    }

    let from_query = parse_lenient(input).and_then(|url| {
        url.query_pairs()
            .find(|(key, _)| key == "product_id")
            .map(|(_, value)| value.trim().to_string())
    });

    from_query
        .or_else(|| {
            CART_PRODUCT_ID
                .captures(input)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .filter(|id| !id.is_empty())
}

/// Numeric id from a `/products/<digits>/` path (storefront image URLs).
fn path_product_id(input: &str) -> Option<String> {
    PATH_PRODUCT_ID
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The input itself, when it points at the storefront and is not a cart link.
fn storefront_url(input: &str, domain: &str) -> Option<String> {
    if input.contains("cart.php") {
        return None;
    }

    let url = parse_lenient(input)?;
    let host = url.host_str()?;
    if !host_matches(host, domain) {
        return None;
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        Some(input.to_string())
    } else {
        Some(url.to_string())
    }
}
