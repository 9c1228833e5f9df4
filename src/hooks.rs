use crate::models::coupon::{Coupon, CouponData};

/// Extension points a storefront can hang site-specific behavior on.
/// Every hook defaults to pass-through, so implementors override only
/// what they need.
pub trait CouponHooks: Send + Sync {
    /// Dataset override: returning `Some` resolves the coupon from
    /// code instead of the record store.
    fn coupon_data(&self, _code: &str) -> Option<CouponData> {
        None
    }

    /// Canonical form of a coupon code. Must match whatever transform
    /// was applied when the coupon was stored, or lookups will miss.
    fn normalize_code(&self, code: &str) -> String {
        code.to_owned()
    }

    /// Final say over the verdict the rule checklist produced. The
    /// return value is authoritative in both directions.
    fn is_valid(&self, valid: bool, _coupon: &Coupon) -> bool {
        valid
    }

    /// Rewrites a failure message before it reaches the shopper, e.g.
    /// for localization.
    fn error_message(&self, message: String, _coupon: &Coupon) -> String {
        message
    }
}

/// The pass-through hook set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl CouponHooks for DefaultHooks {}
