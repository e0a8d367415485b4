use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use comanda_api::{RestaurantApi, Session};
use comanda_common::Secret;
use comanda_engine::{
    cart_types::{OrderId, OrderStatus},
    memory::MemoryBackend,
    CartError,
    CartSessionApi,
    CurrencyDisplay,
    ExchangeRateApi,
    OrderTrackerApi,
};
use log::*;

mod config;
mod interactive;
mod profile_manager;
mod prompts;

use crate::{
    config::ClientConfig,
    interactive::{
        formatting::{format_cart, format_exchange_rate, format_orders},
        track_with_spinner,
        Backend,
        InteractiveApp,
    },
    profile_manager::ProfileManager,
};

#[derive(Parser, Debug)]
#[command(version, about = "Order from Comanda restaurants without leaving the terminal")]
pub struct Arguments {
    /// Run against a built-in demo restaurant instead of the REST API
    #[arg(long)]
    demo: bool,
    /// Leave out to start the interactive menu
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current cart
    Cart,
    /// List my orders, most recent first
    Orders,
    /// Follow an order until it is delivered or cancelled
    Track {
        /// The order number, with or without the leading '#'
        order_id: OrderId,
    },
    /// Show today's dollar exchange rate
    Rate,
    /// Save a session token for later runs
    Login { token: String },
    /// Forget the saved session token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let config = ClientConfig::new_from_env_or_default();
    let profile = ProfileManager::new_default()?;

    match &cli.command {
        Some(Command::Login { token }) => {
            let token = Secret::from(token.trim());
            if token.is_empty() {
                bail!("The token is empty");
            }
            profile.set_token(&token)?;
            println!("Token saved to {}", profile.path().display());
            return Ok(());
        },
        Some(Command::Logout) => {
            profile.clear_token()?;
            println!("Logged out");
            return Ok(());
        },
        _ => {},
    }

    if cli.demo {
        info!("Running against the demo restaurant");
        let backend = MemoryBackend::demo();
        backend.script_statuses([OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered]);
        let profile = ProfileManager::at(profile.path().with_file_name("demo.toml"));
        return run(backend, None, profile, &config, cli.command).await;
    }

    let session = Arc::new(Session::new());
    match profile.token()? {
        Some(token) => session.set_token(token),
        None => match &config.seed_token {
            Some(token) => {
                debug!("Using the token from COMANDA_TOKEN");
                session.set_token(token.clone());
            },
            None => warn!("No session token. Log in first, or most requests will be refused."),
        },
    }
    let api = RestaurantApi::new(config.api.clone(), Arc::clone(&session))?;
    run(api, Some(session), profile, &config, cli.command).await
}

async fn run<B: Backend>(
    backend: B,
    session: Option<Arc<Session>>,
    profile: ProfileManager,
    config: &ClientConfig,
    command: Option<Command>,
) -> Result<()> {
    let display = CurrencyDisplay::default();
    let res = match command {
        None => return InteractiveApp::new(backend, session, profile, config).run().await,
        Some(Command::Cart) => {
            let cart = CartSessionApi::with_policy(backend, config.policy);
            cart.load().await.map(|c| format_cart(&c, &display))
        },
        Some(Command::Orders) => {
            let tracker = OrderTrackerApi::new(backend, config.tracker);
            tracker.my_orders().await.map(|orders| format_orders(&orders, &display))
        },
        Some(Command::Track { order_id }) => {
            let tracker = OrderTrackerApi::new(backend, config.tracker);
            track_with_spinner(&tracker, order_id, &display).await
        },
        Some(Command::Rate) => {
            let display = ExchangeRateApi::new(backend).currency_display().await;
            Ok(format_exchange_rate(display.rate()))
        },
        Some(Command::Login { .. } | Command::Logout) => Ok(String::new()),
    };
    finish(res, &profile)
}

fn finish(res: Result<String, CartError>, profile: &ProfileManager) -> Result<()> {
    match res {
        Ok(output) => {
            println!("{output}");
            Ok(())
        },
        Err(CartError::AuthRequired) => {
            if let Err(e) = profile.clear_token() {
                warn!("Could not clear the saved token. {e}");
            }
            bail!("{}. Save a new token with `comanda login <token>`.", CartError::AuthRequired)
        },
        Err(e) => Err(e.into()),
    }
}
