use std::fmt::Display;

use chrono::NaiveDate;
use comanda_common::{helpers::group_thousands, Colones};

use crate::traits::ExchangeRateError;

/// Where an exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// The live rate service.
    Primary,
    /// The server's cached copy, used when the live service is down.
    Cached,
}

/// The CRC/USD exchange rate, expressed in colones per US dollar.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub buy_rate: f64,
    pub sell_rate: f64,
    pub date: NaiveDate,
    pub source: RateSource,
}

impl ExchangeRate {
    /// Create a new ExchangeRate. Fails if the sell rate is not a positive, finite number, since every USD amount
    /// shown to the customer is divided by it.
    pub fn new(buy_rate: f64, sell_rate: f64, date: NaiveDate, source: RateSource) -> Result<Self, ExchangeRateError> {
        if !sell_rate.is_finite() || sell_rate <= 0.0 {
            return Err(ExchangeRateError::InvalidRate(format!("sell rate must be positive, got {sell_rate}")));
        }
        Ok(Self { buy_rate, sell_rate, date, source })
    }

    /// Convert a colón amount to US dollars at the sell rate.
    pub fn to_usd(&self, amount: Colones) -> f64 {
        amount.as_f64() / self.sell_rate
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1 USD => ₡{:.2} (buy ₡{:.2}, {})", self.sell_rate, self.buy_rate, self.date)?;
        if self.source == RateSource::Cached {
            write!(f, " [cached]")?;
        }
        Ok(())
    }
}

//--------------------------------------   DisplayCurrency    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayCurrency {
    #[default]
    Crc,
    Usd,
}

impl Display for DisplayCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayCurrency::Crc => write!(f, "CRC"),
            DisplayCurrency::Usd => write!(f, "USD"),
        }
    }
}

/// Format a stored colón amount for display.
///
/// In CRC mode this is the amount with thousands separators and the ₡ glyph. In USD mode the amount is divided by
/// the sell rate and shown to two decimal places. When USD is requested but no rate is available the amount is
/// shown in colones. The stored amount is never modified.
pub fn to_display(amount: Colones, mode: DisplayCurrency, rate: Option<&ExchangeRate>) -> String {
    match (mode, rate) {
        (DisplayCurrency::Usd, Some(rate)) => format_usd(rate.to_usd(amount)),
        _ => amount.to_string(),
    }
}

fn format_usd(dollars: f64) -> String {
    let formatted = format!("{:.2}", dollars.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let sign = if dollars < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}${}.{cents}", group_thousands(whole))
}
