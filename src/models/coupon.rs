use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Discount kinds in the shop catalog.
///
/// Per-product kinds discount individual line items; the cart-wide
/// kinds are the ones subject to product/category exclusion checks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountType {
    #[default]
    FixedCart,
    Percent,
    FixedProduct,
    PercentProduct,
}

impl DiscountType {
    pub fn is_per_product(self) -> bool {
        matches!(self, Self::FixedProduct | Self::PercentProduct)
    }
}

/// Structured coupon record a dataset override hands back, letting
/// integrations define coupons in code without touching the record
/// store. Missing fields take the same defaults the loader applies to
/// stored coupons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponData {
    /// Record identity; 0 maps to the not-found sentinel.
    pub id: u64,
    pub discount_type: DiscountType,
    pub amount: Decimal,
    pub individual_use: bool,
    pub product_ids: Vec<String>,
    pub exclude_product_ids: Vec<String>,
    pub usage_limit: u32,
    pub usage_count: u32,
    pub expiry_date: Option<DateTime<Utc>>,
    pub apply_before_tax: bool,
    pub free_shipping: bool,
    pub product_categories: Vec<String>,
    pub exclude_product_categories: Vec<String>,
    pub minimum_amount: Decimal,
    pub customer_email: Vec<String>,
}

impl Default for CouponData {
    fn default() -> Self {
        Self {
            id: 0,
            discount_type: DiscountType::default(),
            amount: Decimal::ZERO,
            individual_use: false,
            product_ids: Vec::new(),
            exclude_product_ids: Vec::new(),
            usage_limit: 0,
            usage_count: 0,
            expiry_date: None,
            apply_before_tax: true,
            free_shipping: false,
            product_categories: Vec::new(),
            exclude_product_categories: Vec::new(),
            minimum_amount: Decimal::ZERO,
            customer_email: Vec::new(),
        }
    }
}

/// A coupon loaded by code.
///
/// `id` is the sole marker of existence: a lookup miss yields a coupon
/// with `id == None` and every other field at its default, and such a
/// coupon never validates. Restriction sets are always materialized;
/// an empty set means "applies to all" / "excludes none".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub id: Option<u64>,
    pub discount_type: DiscountType,
    pub amount: Decimal,
    pub individual_use: bool,
    pub product_ids: BTreeSet<String>,
    pub exclude_product_ids: BTreeSet<String>,
    /// 0 means unlimited.
    pub usage_limit: u32,
    pub usage_count: u32,
    /// `None` never expires.
    pub expiry_date: Option<DateTime<Utc>>,
    pub apply_before_tax: bool,
    pub free_shipping: bool,
    pub product_categories: BTreeSet<String>,
    pub exclude_product_categories: BTreeSet<String>,
    /// Zero means no minimum spend.
    pub minimum_amount: Decimal,
    /// Lower-cased, trimmed. Enforced at checkout, not by the rule
    /// checklist.
    pub customer_email: BTreeSet<String>,
    /// Raw metadata fetched alongside the record, for integrations
    /// that stash extra keys on a coupon.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub custom_fields: BTreeMap<String, Vec<String>>,
    /// Last validation failure, set by the evaluator.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

impl Coupon {
    /// Sentinel for "no such coupon". Carries the requested code so
    /// callers can still report what was asked for.
    pub fn not_found(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            id: None,
            discount_type: DiscountType::default(),
            amount: Decimal::ZERO,
            individual_use: false,
            product_ids: BTreeSet::new(),
            exclude_product_ids: BTreeSet::new(),
            usage_limit: 0,
            usage_count: 0,
            expiry_date: None,
            apply_before_tax: true,
            free_shipping: false,
            product_categories: BTreeSet::new(),
            exclude_product_categories: BTreeSet::new(),
            minimum_amount: Decimal::ZERO,
            customer_email: BTreeSet::new(),
            custom_fields: BTreeMap::new(),
            error_message: None,
        }
    }

    /// Maps a dataset-override record into a coupon. List fields are
    /// trimmed and de-duplicated, emails lower-cased, and a zero id
    /// degrades to the not-found sentinel.
    pub fn from_data(code: impl Into<String>, data: CouponData) -> Self {
        Self {
            code: code.into(),
            id: (data.id != 0).then_some(data.id),
            discount_type: data.discount_type,
            amount: data.amount,
            individual_use: data.individual_use,
            product_ids: trimmed_set(data.product_ids),
            exclude_product_ids: trimmed_set(data.exclude_product_ids),
            usage_limit: data.usage_limit,
            usage_count: data.usage_count,
            expiry_date: data.expiry_date,
            apply_before_tax: data.apply_before_tax,
            free_shipping: data.free_shipping,
            product_categories: trimmed_set(data.product_categories),
            exclude_product_categories: trimmed_set(data.exclude_product_categories),
            minimum_amount: data.minimum_amount,
            customer_email: trimmed_set(
                data.customer_email.into_iter().map(|e| e.to_lowercase()),
            ),
            custom_fields: BTreeMap::new(),
            error_message: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.id.is_some()
    }
}

/// Trims entries and drops the empty ones.
pub(crate) fn trimmed_set<I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}
