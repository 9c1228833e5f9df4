//! Coupon lookup and validity evaluation for storefront carts.
//!
//! A coupon is resolved by code, either from a dataset override hook
//! or from the host's generic record/metadata storage, and then run
//! through an ordered checklist of business rules (usage limits,
//! expiry, minimum spend, product and category eligibility) against a
//! read-only cart snapshot.
//!
//! Storage, the cart, and every extension point are injected
//! collaborators: [`store::RecordStore`], [`models::cart::CartView`]
//! and [`hooks::CouponHooks`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod errors;
pub mod hooks;
pub mod models;
pub mod services;
pub mod store;

pub use errors::ServiceError;
pub use hooks::{CouponHooks, DefaultHooks};
pub use models::cart::{CartView, LineItem};
pub use models::coupon::{Coupon, CouponData, DiscountType};
pub use services::coupons::{CouponService, Validity};
