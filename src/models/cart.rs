use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product entry in a cart. Variable products carry the concrete
/// variation alongside the parent they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub variation_id: Option<String>,
    pub parent_id: Option<String>,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            variation_id: None,
            parent_id: None,
        }
    }

    pub fn with_variation(mut self, variation_id: impl Into<String>) -> Self {
        self.variation_id = Some(variation_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Whether any of the item's identifiers (product, variation,
    /// parent product) appears in `ids`.
    pub fn matches_any(&self, ids: &BTreeSet<String>) -> bool {
        ids.contains(&self.product_id)
            || self.variation_id.as_ref().is_some_and(|v| ids.contains(v))
            || self.parent_id.as_ref().is_some_and(|p| ids.contains(p))
    }
}

/// Read-only snapshot of the shopper's cart, passed explicitly into
/// validity evaluation. The host storefront owns the real cart.
pub trait CartView: Send + Sync {
    fn line_items(&self) -> &[LineItem];

    /// Cart subtotal the minimum-spend rule compares against.
    fn subtotal(&self) -> Decimal;

    /// Categories assigned to a product, for category eligibility and
    /// exclusion rules.
    fn product_categories(&self, product_id: &str) -> BTreeSet<String>;
}
