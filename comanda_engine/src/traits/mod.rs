//! # Backend seams
//!
//! The cart, checkout and payment APIs never talk to the network themselves. They are generic over the traits in
//! this module, which a backend implements: the REST client in `comanda_api` for production, and
//! [`crate::memory::MemoryBackend`] for demos and tests.
//!
//! * [`CartManagement`] fetches and mutates the server-side cart.
//! * [`OrderManagement`] creates orders and reads their status.
//! * [`PaymentMethodManagement`] lists and deletes the customer's stored cards.
//! * [`ExchangeRateSource`] provides the CRC/USD rate, live or cached.
//! * [`SelectionStore`] is the single local slot holding the chosen payment method.
//! * [`UserPrompt`] asks the customer a blocking yes/no question before destructive actions.
//!
//! Every backend call reports failures as a [`BackendError`].
mod backend_error;
mod cart_management;
mod exchange_rates;
mod order_management;
mod payment_methods;
mod selection_store;
mod user_prompt;

pub use backend_error::BackendError;
pub use cart_management::CartManagement;
pub use exchange_rates::{ExchangeRateError, ExchangeRateSource};
pub use order_management::OrderManagement;
pub use payment_methods::PaymentMethodManagement;
pub use selection_store::{SelectionStore, StorageError};
pub use user_prompt::{AssumeYes, UserPrompt};
