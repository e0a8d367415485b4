use std::time::Duration;

use log::*;

/// Limits applied to cart mutations before anything is sent to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartPolicy {
    /// The most units of a single product a line may hold. `None` leaves it to the server.
    pub max_line_quantity: Option<u32>,
}

impl CartPolicy {
    pub fn uncapped() -> Self {
        Self::default()
    }

    pub fn with_max_line_quantity(max: u32) -> Self {
        Self { max_line_quantity: Some(max) }
    }

    /// Reads `COMANDA_MAX_LINE_QUANTITY`. Unset means uncapped.
    pub fn from_env_or_default() -> Self {
        let max_line_quantity = match std::env::var("COMANDA_MAX_LINE_QUANTITY") {
            Ok(s) => match s.trim().parse::<u32>() {
                Ok(0) => {
                    warn!("🪛️ COMANDA_MAX_LINE_QUANTITY must be at least 1. Ignoring the cap.");
                    None
                },
                Ok(n) => Some(n),
                Err(e) => {
                    warn!("🪛️ Invalid COMANDA_MAX_LINE_QUANTITY '{s}'. {e}. Ignoring the cap.");
                    None
                },
            },
            Err(_) => None,
        };
        Self { max_line_quantity }
    }
}

/// Timing for the order status poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub interval: Duration,
    /// Upper bound for the delay after consecutive failed fetches.
    pub max_backoff: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(10), max_backoff: Duration::from_secs(60) }
    }
}

impl TrackerConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let interval = secs_from_env("COMANDA_POLL_INTERVAL_SECS", defaults.interval);
        let max_backoff = secs_from_env("COMANDA_POLL_MAX_BACKOFF_SECS", defaults.max_backoff).max(interval);
        Self { interval, max_backoff }
    }
}

fn secs_from_env(var: &str, default: Duration) -> Duration {
    match std::env::var(var) {
        Ok(s) => match s.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!("🪛️ Invalid value for {var}: '{s}'. Using the default of {}s", default.as_secs());
                default
            },
        },
        Err(_) => default,
    }
}
