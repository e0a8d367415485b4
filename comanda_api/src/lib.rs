//! A `reqwest` client for the restaurant's REST API.
//!
//! [`RestaurantApi`] implements every backend trait of `comanda_engine`, so it can be handed to the cart, checkout,
//! payment and tracking APIs directly. The customer's bearer token lives in a shared [`Session`].
mod api;
mod config;
mod error;
mod session;

pub mod data_objects;

pub use api::RestaurantApi;
pub use config::{ApiConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use error::RestaurantApiError;
pub use session::Session;
