use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::{
    errors::ServiceError,
    hooks::CouponHooks,
    models::{
        cart::CartView,
        coupon::{trimmed_set, Coupon},
    },
    store::{RecordId, RecordStore},
};

/// Record type coupons are filed under in the generic store.
pub const COUPON_RECORD_TYPE: &str = "shop_coupon";

const MSG_INVALID: &str = "Invalid coupon";
const MSG_USAGE_LIMIT: &str = "Coupon usage limit has been reached.";
const MSG_EXPIRED: &str = "This coupon has expired.";
const MSG_NOT_APPLICABLE: &str = "Sorry, this coupon is not applicable to your cart contents.";

/// Outcome of a validity evaluation. Business-rule failures are plain
/// values carrying the shopper-facing message, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid { message: String },
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Validity::Valid => None,
            Validity::Invalid { message } => Some(message),
        }
    }
}

/// Coupon lookup and validity evaluation.
///
/// Loads coupon records from the injected [`RecordStore`] (or from a
/// dataset override) and runs the business-rule checklist against a
/// cart snapshot. Persistence and the cart itself stay with the host.
#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn RecordStore>,
    hooks: Arc<dyn CouponHooks>,
}

impl CouponService {
    pub fn new(store: Arc<dyn RecordStore>, hooks: Arc<dyn CouponHooks>) -> Self {
        Self { store, hooks }
    }

    /// Loads the coupon for `code`.
    ///
    /// A miss is not an error: the returned coupon has no id and every
    /// other field at its default. Malformed metadata degrades to the
    /// per-field default rather than failing the load.
    #[instrument(skip(self))]
    pub fn load(&self, code: &str) -> Result<Coupon, ServiceError> {
        let code = self.hooks.normalize_code(code);

        if let Some(data) = self.hooks.coupon_data(&code) {
            debug!(%code, "coupon resolved from dataset override");
            return Ok(Coupon::from_data(code, data));
        }

        let Some(id) = self
            .store
            .find_published_record_id(COUPON_RECORD_TYPE, &code)?
        else {
            debug!(%code, "no coupon record for code");
            return Ok(Coupon::not_found(code));
        };

        let record = match self.store.get_record(id)? {
            Some(record)
                if record.published && self.hooks.normalize_code(&record.title) == code =>
            {
                record
            }
            _ => {
                warn!(%code, id, "coupon record rejected: unpublished or title mismatch");
                return Ok(Coupon::not_found(code));
            }
        };

        let meta = self.store.get_all_metadata(record.id)?;
        Ok(coupon_from_metadata(code, record.id, meta))
    }

    /// Runs the rule checklist for `coupon` against `cart` as of now.
    ///
    /// Rules never short-circuit: every rule runs, `valid` latches
    /// false once any rule fails, and the last failing rule supplies
    /// the message. The verdict hook then has the final say. On
    /// failure the message is also stored on `coupon.error_message`.
    pub fn is_valid(&self, coupon: &mut Coupon, cart: &dyn CartView) -> Validity {
        self.is_valid_at(coupon, cart, Utc::now())
    }

    /// [`Self::is_valid`] with an explicit clock.
    pub fn is_valid_at(
        &self,
        coupon: &mut Coupon,
        cart: &dyn CartView,
        now: DateTime<Utc>,
    ) -> Validity {
        if coupon.id.is_none() {
            let message = self.hooks.error_message(MSG_INVALID.to_owned(), coupon);
            coupon.error_message = Some(message.clone());
            return Validity::Invalid { message };
        }

        let mut valid = true;
        let mut error: Option<String> = None;

        // Usage limit
        if coupon.usage_limit > 0 && coupon.usage_count >= coupon.usage_limit {
            valid = false;
            error = Some(MSG_USAGE_LIMIT.to_owned());
        }

        // Expired
        if let Some(expiry) = coupon.expiry_date {
            if now > expiry {
                valid = false;
                error = Some(MSG_EXPIRED.to_owned());
            }
        }

        // Minimum spend
        if coupon.minimum_amount > Decimal::ZERO && coupon.minimum_amount > cart.subtotal() {
            valid = false;
            error = Some(format!(
                "The minimum spend for this coupon is {}.",
                coupon.minimum_amount
            ));
        }

        // Product ids: one matching line item is enough.
        if !coupon.product_ids.is_empty() {
            let valid_for_cart = cart
                .line_items()
                .iter()
                .any(|item| item.matches_any(&coupon.product_ids));
            if !valid_for_cart {
                valid = false;
                error = Some(MSG_NOT_APPLICABLE.to_owned());
            }
        }

        // Category ids: one line item in a listed category is enough.
        if !coupon.product_categories.is_empty() {
            let valid_for_cart = cart.line_items().iter().any(|item| {
                !cart
                    .product_categories(&item.product_id)
                    .is_disjoint(&coupon.product_categories)
            });
            if !valid_for_cart {
                valid = false;
                error = Some(MSG_NOT_APPLICABLE.to_owned());
            }
        }

        // Cart-wide discounts cannot be applied while an excluded
        // product sits in the cart. Per-product discounts skip this.
        if !coupon.discount_type.is_per_product() {
            if !coupon.exclude_product_ids.is_empty() {
                let excluded = cart
                    .line_items()
                    .iter()
                    .any(|item| item.matches_any(&coupon.exclude_product_ids));
                if excluded {
                    valid = false;
                    error = Some(MSG_NOT_APPLICABLE.to_owned());
                }
            }

            if !coupon.exclude_product_categories.is_empty() {
                let excluded = cart.line_items().iter().any(|item| {
                    !cart
                        .product_categories(&item.product_id)
                        .is_disjoint(&coupon.exclude_product_categories)
                });
                if excluded {
                    valid = false;
                    error = Some(MSG_NOT_APPLICABLE.to_owned());
                }
            }
        }

        // Site-specific rules get the final, authoritative say.
        let valid = self.hooks.is_valid(valid, coupon);
        if valid {
            return Validity::Valid;
        }

        let message = self
            .hooks
            .error_message(error.unwrap_or_default(), coupon);
        debug!(code = %coupon.code, %message, "coupon rejected");
        coupon.error_message = Some(message.clone());
        Validity::Invalid { message }
    }

    /// Records one redemption. Called when an order is placed; the
    /// evaluator itself never touches the count.
    pub fn increment_usage_count(&self, coupon: &mut Coupon) -> Result<(), ServiceError> {
        let id = self.require_record(coupon)?;
        coupon.usage_count += 1;
        self.persist_usage_count(id, coupon.usage_count)
    }

    /// Backs out one redemption after an order is cancelled or
    /// refunded. Saturates at zero.
    pub fn decrement_usage_count(&self, coupon: &mut Coupon) -> Result<(), ServiceError> {
        let id = self.require_record(coupon)?;
        coupon.usage_count = coupon.usage_count.saturating_sub(1);
        self.persist_usage_count(id, coupon.usage_count)
    }

    fn require_record(&self, coupon: &Coupon) -> Result<RecordId, ServiceError> {
        coupon.id.ok_or_else(|| {
            ServiceError::NotFound(format!("coupon {} has no stored record", coupon.code))
        })
    }

    fn persist_usage_count(&self, id: RecordId, count: u32) -> Result<(), ServiceError> {
        self.store.put_metadata(id, "usage_count", &count.to_string())
    }
}

/// Overlays stored metadata over the documented per-field defaults.
/// A present, non-empty first value wins; anything malformed degrades
/// to the default.
fn coupon_from_metadata(
    code: String,
    id: RecordId,
    meta: BTreeMap<String, Vec<String>>,
) -> Coupon {
    let discount_type = meta_value(&meta, "discount_type")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    let amount = meta_value(&meta, "coupon_amount")
        .and_then(|v| v.parse().ok())
        .unwrap_or(Decimal::ZERO);
    let individual_use = meta_value(&meta, "individual_use").map(is_yes).unwrap_or(false);
    let product_ids = meta_value(&meta, "product_ids")
        .map(split_id_list)
        .unwrap_or_default();
    let exclude_product_ids = meta_value(&meta, "exclude_product_ids")
        .map(split_id_list)
        .unwrap_or_default();
    let usage_limit = meta_value(&meta, "usage_limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let usage_count = meta_value(&meta, "usage_count")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let expiry_date = meta_value(&meta, "expiry_date").and_then(parse_expiry);
    let apply_before_tax = meta_value(&meta, "apply_before_tax").map(is_yes).unwrap_or(true);
    let free_shipping = meta_value(&meta, "free_shipping").map(is_yes).unwrap_or(false);
    let product_categories = meta_value(&meta, "product_categories")
        .map(decode_list)
        .unwrap_or_default();
    let exclude_product_categories = meta_value(&meta, "exclude_product_categories")
        .map(decode_list)
        .unwrap_or_default();
    let minimum_amount = meta_value(&meta, "minimum_amount")
        .and_then(|v| v.parse().ok())
        .unwrap_or(Decimal::ZERO);
    let customer_email = meta_value(&meta, "customer_email")
        .map(|v| trimmed_set(decode_list(v).iter().map(|e| e.to_lowercase())))
        .unwrap_or_default();

    Coupon {
        code,
        id: Some(id),
        discount_type,
        amount,
        individual_use,
        product_ids,
        exclude_product_ids,
        usage_limit,
        usage_count,
        expiry_date,
        apply_before_tax,
        free_shipping,
        product_categories,
        exclude_product_categories,
        minimum_amount,
        customer_email,
        custom_fields: meta,
        error_message: None,
    }
}

/// First metadata value for `key`, if present and non-empty.
fn meta_value<'a>(meta: &'a BTreeMap<String, Vec<String>>, key: &str) -> Option<&'a str> {
    meta.get(key)
        .and_then(|values| values.first())
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn is_yes(value: &str) -> bool {
    value == "yes"
}

/// `"10, 12,,"` -> `{"10", "12"}`.
fn split_id_list(value: &str) -> BTreeSet<String> {
    trimmed_set(value.split(','))
}

/// List fields are stored JSON-encoded. A bare scalar degrades to a
/// singleton set, undecodable garbage to an empty one.
fn decode_list(value: &str) -> BTreeSet<String> {
    match serde_json::from_str::<Vec<String>>(value) {
        Ok(items) => trimmed_set(items),
        Err(_) if !value.trim_start().starts_with(['[', '{']) => trimmed_set([value]),
        Err(_) => BTreeSet::new(),
    }
}

/// Dates are stored either as `YYYY-MM-DD` (midnight UTC) or RFC 3339.
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
