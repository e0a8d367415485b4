//! Comanda engine
//!
//! The client-side logic of a restaurant ordering service: the shopping cart, coupons, pickup branch, payment method,
//! checkout and order tracking. Everything here talks to the restaurant through the backend traits in [`traits`],
//! so the library knows nothing about HTTP.
//!
//! The library is divided into three main sections:
//! 1. Domain types ([`cart_types`]): carts, lines, branches, coupons, totals and orders.
//! 2. Backend seams ([`traits`]). `comanda_api` implements them over REST; [`memory`] implements them in memory for
//!    demos and tests.
//! 3. The public API ([`mod@cart_api`]). Each API owns one part of the flow and reports failures as [`CartError`]s
//!    that a front end can show directly.
pub mod cart_api;
pub mod cart_types;
pub mod helpers;
pub mod memory;
pub mod traits;

pub use cart_api::{
    cart_session_api::CartSessionApi,
    checkout_api::CheckoutApi,
    checkout_objects,
    errors::CartError,
    exchange_objects,
    exchange_rate_api::{CurrencyDisplay, ExchangeRateApi},
    order_tracker_api::OrderTrackerApi,
    payment_objects,
    payment_selector_api::PaymentSelectorApi,
    policy::{CartPolicy, TrackerConfig},
};
