use std::time::Duration;

use log::*;
use url::Url;

use crate::RestaurantApiError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// The API root, without a trailing slash. Endpoint paths are appended to it.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_URL.to_string(), timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS) }
    }
}

impl ApiConfig {
    /// Validate and normalise an API root such as `https://comanda.example.cr/api/`.
    pub fn with_base_url(base_url: &str) -> Result<Self, RestaurantApiError> {
        let url = Url::parse(base_url.trim())
            .map_err(|e| RestaurantApiError::Initialization(format!("Invalid API URL '{base_url}'. {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RestaurantApiError::Initialization(format!("The API URL must be http(s), got {url}")));
        }
        let base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(Self { base_url, ..Default::default() })
    }

    pub fn new_from_env_or_default() -> Self {
        let mut config = match std::env::var("COMANDA_API_URL") {
            Ok(s) => Self::with_base_url(&s).unwrap_or_else(|e| {
                error!("🪛️ {e}. Using the default of {DEFAULT_API_URL}");
                Self::default()
            }),
            Err(_) => {
                warn!("🪛️ COMANDA_API_URL is not set. Using the default of {DEFAULT_API_URL}");
                Self::default()
            },
        };
        config.timeout = parse_timeout(std::env::var("COMANDA_API_TIMEOUT_SECS").ok()).unwrap_or(config.timeout);
        debug!("🪛️ REST API at {} (timeout {}s)", config.base_url, config.timeout.as_secs());
        config
    }
}

/// A request timeout in whole seconds. Zero would fail every request, so it is refused.
fn parse_timeout(value: Option<String>) -> Option<Duration> {
    let s = value?;
    match s.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        Ok(_) => {
            warn!("🪛️ COMANDA_API_TIMEOUT_SECS must be at least 1. Using the default of {DEFAULT_TIMEOUT_SECS}s");
            None
        },
        Err(e) => {
            warn!("🪛️ Invalid COMANDA_API_TIMEOUT_SECS '{s}'. {e}");
            None
        },
    }
}
