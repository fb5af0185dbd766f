//! Embedded-data extraction strategies.
//!
//! Product pages carry their data in one of several script payloads. Each
//! strategy is a named pure function over the parsed document; a strategy
//! list is applied in order and the first one that yields a fragment wins.
//! Support for a new payload shape is added by appending a strategy.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::models::{SourceFragment, Variant};

/// A named extraction function.
#[derive(Clone, Copy)]
pub struct ExtractionStrategy {
    pub name: &'static str,
    pub extract: fn(&Html) -> Option<SourceFragment>,
}

/// Strategies for the canonical product page, in priority order.
pub const PAGE_STRATEGIES: &[ExtractionStrategy] = &[
    ExtractionStrategy {
        name: "next_data.page_props",
        extract: next_data_page_props,
    },
    ExtractionStrategy {
        name: "next_data.initial_props",
        extract: next_data_initial_props,
    },
];

/// Strategies for the storefront's alternate data blobs, in priority order.
pub const STOREFRONT_STRATEGIES: &[ExtractionStrategy] = &[
    ExtractionStrategy {
        name: "next_data.storefront_id",
        extract: next_data_storefront,
    },
    ExtractionStrategy {
        name: "bc_data",
        extract: bc_data,
    },
    ExtractionStrategy {
        name: "json_ld",
        extract: json_ld_product,
    },
];

/// Parse `html` and return the first fragment produced by `strategies`,
/// with the name of the strategy that produced it.
pub fn apply(
    strategies: &[ExtractionStrategy],
    html: &str,
) -> Option<(&'static str, SourceFragment)> {
    let document = Html::parse_document(html);
    strategies
        .iter()
        .find_map(|strategy| (strategy.extract)(&document).map(|f| (strategy.name, f)))
}

// --- Strategies ---

fn next_data_page_props(document: &Html) -> Option<SourceFragment> {
    let data = next_data(document)?;
    let product = object_at(&data, "/props/pageProps/product")?;
    Some(product_fragment(product))
}

fn next_data_initial_props(document: &Html) -> Option<SourceFragment> {
    let data = next_data(document)?;
    let product = object_at(&data, "/props/initialProps/pageProps/product")?;
    Some(product_fragment(product))
}

/// Graph id and path of the embedded product, whichever props branch holds it.
fn next_data_storefront(document: &Html) -> Option<SourceFragment> {
    let data = next_data(document)?;
    let product = object_at(&data, "/props/pageProps/product")
        .or_else(|| object_at(&data, "/props/initialProps/pageProps/product"))?;

    let aux_id = product.get("id").and_then(json_string)?;
    let mut fragment = product_fragment(product);
    fragment.aux_id = Some(aux_id);
    fragment.url = product.get("path").and_then(json_string);
    Some(fragment)
}

/// `var BCData = {...};` emitted by stencil themes.
fn bc_data(document: &Html) -> Option<SourceFragment> {
    let selector = Selector::parse("script").ok()?;
    let blob = document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .find_map(|text| {
            let start = text.find("BCData")?;
            let brace = text[start..].find('{')? + start;
            first_json_value(&text[brace..])
        })?;

    let attributes = blob.get("product_attributes")?;
    let product_id = attributes
        .get("product_id")
        .and_then(json_string)
        .filter(|id| is_digits(id));
    let sku = attributes.get("sku").and_then(json_string);

    // `stock` is null when the theme hides inventory; that stays unknown.
    let variants = attributes.get("stock").and_then(json_u64).and_then(|stock| {
        let variant_id = attributes
            .get("v3_variant_id")
            .and_then(json_string)
            .or_else(|| product_id.clone())?;
        Some(vec![Variant::new(variant_id, sku.clone().unwrap_or_default(), stock)])
    });

    let fragment = SourceFragment {
        aux_id: product_id.clone(),
        product_id,
        sku,
        price: attributes
            .pointer("/price/without_tax/value")
            .or_else(|| attributes.pointer("/price/with_tax/value"))
            .and_then(json_f64),
        variants,
        ..SourceFragment::default()
    };

    (!fragment.is_empty()).then_some(fragment)
}

/// First `application/ld+json` object typed as a Product.
fn json_ld_product(document: &Html) -> Option<SourceFragment> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    let product = document
        .select(&selector)
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find_map(|value| find_ld_product(&value).cloned())?;

    let product_id = product.get("productID").and_then(json_string);
    let image = match product.get("image") {
        Some(Value::Array(images)) => images.first().and_then(json_string),
        Some(value) => json_string(value),
        None => None,
    };
    let offer = match product.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        other => other,
    };

    let fragment = SourceFragment {
        product_id: product_id.clone().filter(|id| is_digits(id)),
        aux_id: product_id,
        url: product.get("url").and_then(json_string),
        name: product.get("name").and_then(json_string),
        price: offer.and_then(|o| o.get("price")).and_then(json_f64),
        sku: product.get("sku").and_then(json_string),
        image,
        variants: None,
    };

    (!fragment.is_empty()).then_some(fragment)
}

// --- Helpers ---

fn next_data(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let script = document.select(&selector).next()?;
    serde_json::from_str(&script.text().collect::<String>()).ok()
}

fn object_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    value.pointer(pointer).filter(|v| v.is_object())
}

fn find_ld_product(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_ld_product),
        Value::Object(map) => {
            let is_product = match map.get("@type") {
                Some(Value::String(t)) => t == "Product",
                Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
                _ => false,
            };
            if is_product {
                Some(value)
            } else {
                map.get("@graph").and_then(find_ld_product)
            }
        }
        _ => None,
    }
}

/// Catalog product object into a fragment. Missing price and inventory
/// count as zero, as the storefront renders them.
fn product_fragment(product: &Value) -> SourceFragment {
    let image = product
        .pointer("/defaultImage/urlOriginal")
        .and_then(json_string)
        .or_else(|| product.pointer("/images/0/urlOriginal").and_then(json_string))
        .or_else(|| product.pointer("/images/edges/0/node/urlOriginal").and_then(json_string));

    SourceFragment {
        product_id: product
            .get("entityId")
            .and_then(json_string)
            .filter(|id| is_digits(id)),
        aux_id: None,
        url: None,
        name: product.get("name").and_then(json_string),
        price: Some(
            product
                .pointer("/prices/price/value")
                .and_then(json_f64)
                .unwrap_or(0.0),
        ),
        sku: product.get("sku").and_then(json_string),
        image,
        variants: Some(variant_list(product.get("variants"))),
    }
}

/// Variants from either a plain array or a GraphQL `edges[].node` list.
fn variant_list(value: Option<&Value>) -> Vec<Variant> {
    let nodes: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map
            .get("edges")
            .and_then(Value::as_array)
            .map(|edges| edges.iter().filter_map(|e| e.get("node")).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    nodes
        .into_iter()
        .filter_map(|node| {
            let variant_id = node.get("entityId").and_then(json_string)?;
            let sku = node.get("sku").and_then(json_string).unwrap_or_default();
            let inventory = node
                .pointer("/inventory/aggregated/availableToSell")
                .and_then(json_u64)
                .unwrap_or(0);
            Some(Variant::new(variant_id, sku, inventory))
        })
        .collect()
}

fn first_json_value(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()?
        .ok()
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Non-empty string, or a number rendered as a string.
pub(crate) fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative integer; negative or fractional stock counts clamp down.
pub(crate) fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f.floor() as u64 } else { 0 })),
        Value::String(s) => s.trim().parse::<i64>().ok().map(|n| n.max(0) as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_data_page(branch: &str, product: &str) -> String {
        format!(
            r#"<html><head></head><body>
            <script id="__NEXT_DATA__" type="application/json">{{"props":{{{branch}}}}}</script>
            </body></html>"#,
            branch = branch.replace("PRODUCT", product)
        )
    }

    const PRODUCT: &str = r#"{
        "id": "UHJvZHVjdDoxMjM0NQ==",
        "entityId": 12345,
        "name": "Bashful Bunny",
        "sku": "BAS3BC",
        "path": "/bashful-bunny/",
        "prices": {"price": {"value": 25.0}},
        "defaultImage": {"urlOriginal": "https://cdn.example.com/bunny.jpg"},
        "variants": [
            {"entityId": 1, "sku": "BAS3BC-S", "inventory": {"aggregated": {"availableToSell": 0}}},
            {"entityId": 2, "sku": "BAS3BC-M", "inventory": {"aggregated": {"availableToSell": 7}}},
            {"sku": "orphan"}
        ]
    }"#;

    #[test]
    fn test_page_props_strategy() {
        let html = next_data_page(r#""pageProps":{"product":PRODUCT}"#, PRODUCT);
        let (name, fragment) = apply(PAGE_STRATEGIES, &html).unwrap();

        assert_eq!(name, "next_data.page_props");
        assert_eq!(fragment.product_id.as_deref(), Some("12345"));
        assert_eq!(fragment.name.as_deref(), Some("Bashful Bunny"));
        assert_eq!(fragment.price, Some(25.0));
        assert_eq!(
            fragment.image.as_deref(),
            Some("https://cdn.example.com/bunny.jpg")
        );

        let variants = fragment.variants.unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0], Variant::new("1", "BAS3BC-S", 0));
        assert_eq!(variants[1], Variant::new("2", "BAS3BC-M", 7));
    }

    #[test]
    fn test_initial_props_fallback() {
        let html = next_data_page(r#""initialProps":{"pageProps":{"product":PRODUCT}}"#, PRODUCT);
        let (name, fragment) = apply(PAGE_STRATEGIES, &html).unwrap();
        assert_eq!(name, "next_data.initial_props");
        assert_eq!(fragment.product_id.as_deref(), Some("12345"));
    }

    #[test]
    fn test_missing_payload_yields_none() {
        assert!(apply(PAGE_STRATEGIES, "<html><body>Not found</body></html>").is_none());
        let html = next_data_page(r#""pageProps":{}"#, PRODUCT);
        assert!(apply(PAGE_STRATEGIES, &html).is_none());
    }

    #[test]
    fn test_defaults_for_missing_price_and_inventory() {
        let product = r#"{"entityId": 9, "name": "Plain", "images": [{"urlOriginal": "a.jpg"}],
            "variants": [{"entityId": 3, "sku": "P"}]}"#;
        let html = next_data_page(r#""pageProps":{"product":PRODUCT}"#, product);
        let (_, fragment) = apply(PAGE_STRATEGIES, &html).unwrap();

        assert_eq!(fragment.price, Some(0.0));
        assert_eq!(fragment.image.as_deref(), Some("a.jpg"));
        assert_eq!(fragment.variants.unwrap()[0].inventory, 0);
    }

    #[test]
    fn test_graphql_edge_variants() {
        let product = r#"{"entityId": 9, "variants": {"edges": [
            {"node": {"entityId": 31, "sku": "E1", "inventory": {"aggregated": {"availableToSell": 4}}}}
        ]}}"#;
        let html = next_data_page(r#""pageProps":{"product":PRODUCT}"#, product);
        let (_, fragment) = apply(PAGE_STRATEGIES, &html).unwrap();
        assert_eq!(fragment.variants.unwrap(), vec![Variant::new("31", "E1", 4)]);
    }

    #[test]
    fn test_storefront_next_data_wins_first() {
        let html = format!(
            "{}<script>var BCData = {{\"product_attributes\":{{\"sku\":\"OTHER\"}}}};</script>",
            next_data_page(r#""pageProps":{"product":PRODUCT}"#, PRODUCT)
        );
        let (name, fragment) = apply(STOREFRONT_STRATEGIES, &html).unwrap();

        assert_eq!(name, "next_data.storefront_id");
        assert_eq!(fragment.aux_id.as_deref(), Some("UHJvZHVjdDoxMjM0NQ=="));
        assert_eq!(fragment.url.as_deref(), Some("/bashful-bunny/"));
        assert_eq!(fragment.sku.as_deref(), Some("BAS3BC"));
    }

    #[test]
    fn test_bc_data_strategy() {
        let html = r#"<html><script type="text/javascript">
            var BCData = {"csrf_token":"x","product_attributes":{"sku":"BAS3BC","product_id":12345,
            "price":{"without_tax":{"value":25,"currency":"USD"}},"stock":null}};
            var other = {};
        </script></html>"#;
        let (name, fragment) = apply(STOREFRONT_STRATEGIES, html).unwrap();

        assert_eq!(name, "bc_data");
        assert_eq!(fragment.product_id.as_deref(), Some("12345"));
        assert_eq!(fragment.aux_id.as_deref(), Some("12345"));
        assert_eq!(fragment.sku.as_deref(), Some("BAS3BC"));
        assert_eq!(fragment.price, Some(25.0));
        assert_eq!(fragment.variants, None);
    }

    #[test]
    fn test_bc_data_stock_becomes_inventory() {
        let html = r#"<script>var BCData = {"product_attributes":{"sku":"BAS3BC","product_id":12345,
            "v3_variant_id":678,"stock":4,"instock":true}};</script>"#;
        let (_, fragment) = apply(STOREFRONT_STRATEGIES, html).unwrap();
        assert_eq!(fragment.variants, Some(vec![Variant::new("678", "BAS3BC", 4)]));

        let html = r#"<script>var BCData = {"product_attributes":{"sku":"BAS3BC","product_id":12345,
            "stock":0}};</script>"#;
        let (_, fragment) = apply(STOREFRONT_STRATEGIES, html).unwrap();
        let variants = fragment.variants.unwrap();
        assert_eq!(variants, vec![Variant::new("12345", "BAS3BC", 0)]);
        assert!(!variants[0].available);
    }

    #[test]
    fn test_json_ld_strategy() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@context":"https://schema.org","@type":"BreadcrumbList"}</script>
            <script type="application/ld+json">{"@graph":[{"@type":"Product","productID":"12345",
              "name":"Bashful Bunny","sku":"BAS3BC","url":"https://us.jellycat.com/bashful-bunny/",
              "image":["https://cdn.example.com/1.jpg"],"offers":[{"price":"25.00"}]}]}</script>
        </head></html>"#;
        let (name, fragment) = apply(STOREFRONT_STRATEGIES, html).unwrap();

        assert_eq!(name, "json_ld");
        assert_eq!(fragment.product_id.as_deref(), Some("12345"));
        assert_eq!(fragment.aux_id.as_deref(), Some("12345"));
        assert_eq!(
            fragment.url.as_deref(),
            Some("https://us.jellycat.com/bashful-bunny/")
        );
        assert_eq!(fragment.image.as_deref(), Some("https://cdn.example.com/1.jpg"));
        assert_eq!(fragment.price, Some(25.0));
    }

    #[test]
    fn test_json_value_helpers() {
        assert_eq!(json_string(&serde_json::json!(12)), Some("12".into()));
        assert_eq!(json_string(&serde_json::json!("  ")), None);
        assert_eq!(json_u64(&serde_json::json!(-3)), Some(0));
        assert_eq!(json_u64(&serde_json::json!("5")), Some(5));
        assert_eq!(json_f64(&serde_json::json!("9.5")), Some(9.5));
    }
}
