//! Domain events emitted by the diff engine.

use serde::{Deserialize, Serialize};

/// A state transition worth alerting on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductEvent {
    /// A product id was resolved for the first time.
    NewProduct {
        product_id: String,
        name: String,
        url: String,
    },
    /// A variant went from zero inventory to some.
    Restock {
        product_id: String,
        name: String,
        url: String,
        variant_id: String,
        sku: String,
        inventory: u64,
    },
}

impl ProductEvent {
    pub fn product_id(&self) -> &str {
        match self {
            Self::NewProduct { product_id, .. } | Self::Restock { product_id, .. } => product_id,
        }
    }

    /// Alert subject line.
    pub fn subject(&self) -> String {
        match self {
            Self::NewProduct { name, .. } => format!("New Product: {name}"),
            Self::Restock { name, .. } => format!("Restock Alert: {name}"),
        }
    }

    /// Plain-text alert body.
    pub fn body(&self) -> String {
        match self {
            Self::NewProduct { name, url, .. } => format!("{name}\n{url}"),
            Self::Restock {
                name,
                url,
                sku,
                inventory,
                ..
            } => format!("{name}\nSKU: {sku}\nAvailable: {inventory}\n{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restock_format() {
        let event = ProductEvent::Restock {
            product_id: "12345".into(),
            name: "Bashful Bunny".into(),
            url: "https://us.jellycat.com/bashful-bunny/".into(),
            variant_id: "77".into(),
            sku: "BAS3BC".into(),
            inventory: 3,
        };

        assert_eq!(event.subject(), "Restock Alert: Bashful Bunny");
        assert_eq!(
            event.body(),
            "Bashful Bunny\nSKU: BAS3BC\nAvailable: 3\nhttps://us.jellycat.com/bashful-bunny/"
        );
        assert_eq!(event.product_id(), "12345");
    }

    #[test]
    fn test_serialized_tag() {
        let event = ProductEvent::NewProduct {
            product_id: "1".into(),
            name: "Amuseable".into(),
            url: "https://example.com".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "new_product");
    }
}
