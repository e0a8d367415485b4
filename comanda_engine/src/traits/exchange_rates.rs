use thiserror::Error;

use crate::cart_api::exchange_objects::ExchangeRate;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeRateError {
    #[error("The exchange rate service is unavailable: {0}")]
    Unavailable(String),
    #[error("The exchange rate is not usable: {0}")]
    InvalidRate(String),
}

#[allow(async_fn_in_trait)]
pub trait ExchangeRateSource {
    /// Fetch today's rate from the live service.
    async fn fetch_live_rate(&self) -> Result<ExchangeRate, ExchangeRateError>;
    /// Fetch the last rate the server cached. Used when the live service fails.
    async fn fetch_cached_rate(&self) -> Result<ExchangeRate, ExchangeRateError>;
}
