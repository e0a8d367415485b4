//! Fetching the CRC/USD exchange rate, and the display currency toggle that depends on it.

use std::fmt::Debug;

use comanda_common::Colones;
use log::*;

use crate::{
    cart_api::exchange_objects::{to_display, DisplayCurrency, ExchangeRate},
    traits::ExchangeRateSource,
};

pub struct ExchangeRateApi<B> {
    backend: B,
}

impl<B> Debug for ExchangeRateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExchangeRateApi")
    }
}

impl<B> ExchangeRateApi<B>
where B: ExchangeRateSource
{
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Fetch today's rate, falling back to the server's cached rate. Returns `None` if neither is available, in
    /// which case prices can only be shown in colones.
    pub async fn fetch_rate(&self) -> Option<ExchangeRate> {
        match self.backend.fetch_live_rate().await {
            Ok(rate) => {
                debug!("💱️ Live exchange rate: {rate}");
                return Some(rate);
            },
            Err(e) => warn!("💱️ Live exchange rate unavailable. {e}. Trying the cached rate."),
        }
        match self.backend.fetch_cached_rate().await {
            Ok(rate) => {
                debug!("💱️ Cached exchange rate: {rate}");
                Some(rate)
            },
            Err(e) => {
                warn!("💱️ Cached exchange rate unavailable. {e}. Prices will only be shown in colones.");
                None
            },
        }
    }

    /// Fetch the rate and wrap it in a [`CurrencyDisplay`], starting in colones.
    pub async fn currency_display(&self) -> CurrencyDisplay {
        CurrencyDisplay::new(self.fetch_rate().await)
    }
}

/// The customer's choice of display currency, for one session.
#[derive(Debug, Clone, Default)]
pub struct CurrencyDisplay {
    rate: Option<ExchangeRate>,
    mode: DisplayCurrency,
}

impl CurrencyDisplay {
    pub fn new(rate: Option<ExchangeRate>) -> Self {
        Self { rate, mode: DisplayCurrency::Crc }
    }

    pub fn rate(&self) -> Option<&ExchangeRate> {
        self.rate.as_ref()
    }

    /// Switching to dollars is only possible with a rate.
    pub fn toggle_available(&self) -> bool {
        self.rate.is_some()
    }

    pub fn mode(&self) -> DisplayCurrency {
        self.mode
    }

    /// Switch between colones and dollars. Does nothing if there is no rate.
    pub fn toggle(&mut self) -> DisplayCurrency {
        if self.toggle_available() {
            self.mode = match self.mode {
                DisplayCurrency::Crc => DisplayCurrency::Usd,
                DisplayCurrency::Usd => DisplayCurrency::Crc,
            };
        }
        self.mode
    }

    pub fn format(&self, amount: Colones) -> String {
        to_display(amount, self.mode, self.rate.as_ref())
    }
}
