use comanda_api::ApiConfig;
use comanda_common::{helpers::parse_boolean_flag, Secret};
use comanda_engine::{CartPolicy, TrackerConfig};
use log::*;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub policy: CartPolicy,
    pub tracker: TrackerConfig,
    /// Answer yes to every confirmation. For scripted use.
    pub assume_yes: bool,
    /// Used when the local state holds no token.
    pub seed_token: Option<Secret<String>>,
}

impl ClientConfig {
    pub fn new_from_env_or_default() -> Self {
        let assume_yes = parse_boolean_flag(std::env::var("COMANDA_ASSUME_YES").ok(), false);
        if assume_yes {
            warn!("🪛️ COMANDA_ASSUME_YES is set. Every confirmation will be answered with yes.");
        }
        let seed_token = std::env::var("COMANDA_TOKEN").ok().map(Secret::from).filter(|t| !t.is_empty());
        Self {
            api: ApiConfig::new_from_env_or_default(),
            policy: CartPolicy::from_env_or_default(),
            tracker: TrackerConfig::from_env_or_default(),
            assume_yes,
            seed_token,
        }
    }
}
