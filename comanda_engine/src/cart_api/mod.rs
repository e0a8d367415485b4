//! # Cart and checkout API
//!
//! The `cart_api` module exposes the programmatic API the front end drives. Each API covers one screen's worth of
//! behaviour, so a front end can pick the ones it needs:
//!
//! * [`cart_session_api`] keeps the server-synced cart: loading, quantities, coupons and the pickup branch.
//! * [`checkout_api`] validates the cart, asks for confirmation and creates the order.
//! * [`payment_selector_api`] chooses between cash and stored cards, and remembers the choice locally.
//! * [`exchange_rate_api`] fetches the CRC/USD rate and toggles the display currency.
//! * [`order_tracker_api`] lists orders and follows one order until it is delivered or cancelled.
//!
//! The other submodules hold the types these APIs exchange.
//!
//! # API usage
//!
//! Every API is created from a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use comanda_engine::{CartSessionApi, memory::{MemoryBackend, ScriptedPrompt}};
//! let backend = MemoryBackend::demo();
//! let cart = CartSessionApi::new(backend.clone());
//! let session = cart.load().await?;
//! let line = session.lines[0].id;
//! cart.remove_line(line, &ScriptedPrompt::answering([true])).await?;
//! ```
pub mod cart_session_api;
pub mod checkout_api;
pub mod checkout_objects;
pub mod errors;
pub mod exchange_objects;
pub mod exchange_rate_api;
pub mod order_tracker_api;
pub mod payment_objects;
pub mod payment_selector_api;
pub mod policy;
