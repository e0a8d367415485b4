use std::{fmt::Display, sync::Arc, time::Duration};

use anyhow::Result;
use comanda_api::Session;
use comanda_common::Secret;
use comanda_engine::{
    cart_types::{CartLine, Order, OrderId},
    checkout_objects::{CartUpdate, CheckoutStep, Navigation},
    traits::{CartManagement, ExchangeRateSource, OrderManagement, PaymentMethodManagement},
    CartError,
    CartSessionApi,
    CheckoutApi,
    CurrencyDisplay,
    ExchangeRateApi,
    OrderTrackerApi,
    PaymentSelectorApi,
};
use dialoguer::{console::Style, theme::ColorfulTheme, FuzzySelect, Input};
use indicatif::{ProgressBar, ProgressStyle};
use log::*;

use crate::{
    config::ClientConfig,
    interactive::{
        formatting::{
            format_cart,
            format_checkout_summary,
            format_exchange_rate,
            format_order,
            format_orders,
            format_payment_methods,
        },
        menus::*,
    },
    profile_manager::ProfileManager,
    prompts::DialoguerPrompt,
};

pub mod formatting;
pub mod menus;

/// Everything the terminal client needs from a backend.
pub trait Backend: CartManagement + OrderManagement + PaymentMethodManagement + ExchangeRateSource + Clone {}

impl<T> Backend for T where T: CartManagement + OrderManagement + PaymentMethodManagement + ExchangeRateSource + Clone {}

pub struct InteractiveApp<B> {
    backend: B,
    /// `None` when running against the in-memory demo backend.
    session: Option<Arc<Session>>,
    profile: ProfileManager,
    cart: CartSessionApi<B>,
    payments: PaymentSelectorApi<B, ProfileManager>,
    tracker: OrderTrackerApi<B>,
    display: CurrencyDisplay,
    prompt: DialoguerPrompt,
    current_menu: &'static Menu,
    breadcrumbs: Vec<&'static Menu>,
}

impl<B: Backend> InteractiveApp<B> {
    pub fn new(backend: B, session: Option<Arc<Session>>, profile: ProfileManager, config: &ClientConfig) -> Self {
        let cart = CartSessionApi::with_policy(backend.clone(), config.policy);
        let payments = PaymentSelectorApi::new(backend.clone(), profile.clone());
        let tracker = OrderTrackerApi::new(backend.clone(), config.tracker);
        Self {
            backend,
            session,
            profile,
            cart,
            payments,
            tracker,
            display: CurrencyDisplay::default(),
            prompt: DialoguerPrompt::new(config.assume_yes),
            current_menu: top_menu(),
            breadcrumbs: vec![top_menu()],
        }
    }

    pub fn menu_prompt(&self) -> String {
        let breadcrumbs = self.breadcrumbs.iter().map(|m| m.0).collect::<Vec<&str>>().join(" » ");
        let status = match &self.session {
            None => String::from("Demo mode"),
            Some(s) if s.is_authenticated() => String::from("Logged in"),
            Some(_) => String::from("Not logged in"),
        };
        format!("{breadcrumbs:-30}{status:20}{}", self.display.mode())
    }

    pub fn pop_menu(&mut self) {
        if self.breadcrumbs.len() > 1 {
            self.breadcrumbs.pop();
        }
        self.current_menu = self.breadcrumbs.last().copied().unwrap_or_else(top_menu);
    }

    pub fn select_menu(&mut self, menu: &'static Menu) {
        self.breadcrumbs.push(menu);
        self.current_menu = menu;
    }

    pub async fn run(&mut self) -> Result<()> {
        let theme = ColorfulTheme { prompt_style: Style::new().magenta().bold(), ..ColorfulTheme::default() };
        loop {
            let i = FuzzySelect::with_theme(&theme)
                .with_prompt(self.menu_prompt())
                .items(self.current_menu.1)
                .interact()?;
            let res = match self.current_menu.1[i] {
                NAV_TO_CART_MENU => {
                    self.select_menu(cart_menu());
                    continue;
                },
                NAV_TO_PAYMENT_MENU => {
                    self.select_menu(payment_menu());
                    continue;
                },
                NAV_TO_ORDERS_MENU => {
                    self.select_menu(orders_menu());
                    continue;
                },
                NAV_BACK => {
                    self.pop_menu();
                    continue;
                },
                VIEW_CART => self.view_cart().await,
                ADD_PRODUCT => self.add_product().await,
                INCREMENT => self.increment().await,
                DECREMENT => self.decrement().await,
                REMOVE_ITEM => self.remove_item().await,
                APPLY_COUPON => self.apply_coupon().await,
                REMOVE_COUPON => self.remove_coupon().await,
                SELECT_BRANCH => self.select_branch().await,
                CHECKOUT => self.checkout().await,
                VIEW_PAYMENTS => self.view_payments().await,
                CHOOSE_PAYMENT => self.choose_payment().await,
                REMOVE_CARD => self.remove_card().await,
                MY_ORDERS => self.my_orders().await,
                TRACK_ORDER => self.track_order().await,
                EXCHANGE_RATE => self.exchange_rate().await,
                TOGGLE_CURRENCY => self.toggle_currency().await,
                LOGIN => self.login(),
                LOGOUT => self.logout().await,
                EXIT => break,
                _ => continue,
            };
            self.handle_response(res).await;
        }
        Ok(())
    }

    async fn handle_response<T: Display>(&mut self, res: Result<T>) {
        match res {
            Ok(res) => println!("{res}"),
            Err(e) => {
                println!("Error: {e}");
                if matches!(e.downcast_ref::<CartError>(), Some(CartError::AuthRequired)) {
                    self.on_auth_required().await;
                }
            },
        }
    }

    async fn on_auth_required(&mut self) {
        if let Some(session) = &self.session {
            session.clear();
        }
        if let Err(e) = self.profile.clear_token() {
            warn!("Could not clear the saved token. {e}");
        }
        self.cart.invalidate().await;
        println!("{}. Choose '{LOGIN}' to paste a new token.", Navigation::Login);
    }

    //------------------------------------------    Cart    -----------------------------------------------------------
    async fn view_cart(&mut self) -> Result<String> {
        let cart = self.cart.load().await?;
        Ok(format_cart(&cart, &self.display))
    }

    async fn add_product(&mut self) -> Result<String> {
        let product_id = Input::<i64>::new().with_prompt("Product id").interact_text()?;
        let quantity = Input::<u32>::new().with_prompt("Quantity").default(1).interact_text()?;
        let cart = self.cart.add_product(product_id.into(), quantity).await?;
        Ok(format_cart(&cart, &self.display))
    }

    async fn pick_line(&mut self) -> Result<CartLine> {
        let cart = match self.cart.snapshot().await {
            Some(cart) => cart,
            None => self.cart.load().await?,
        };
        if cart.is_empty() {
            return Err(CartError::Validation("Your cart is empty".into()).into());
        }
        let items = cart.lines.iter().map(|l| format!("{} x{}", l.name, l.quantity)).collect::<Vec<String>>();
        let i = FuzzySelect::new().with_prompt("Which item?").items(&items).interact()?;
        Ok(cart.lines[i].clone())
    }

    async fn increment(&mut self) -> Result<String> {
        let line = self.pick_line().await?;
        let cart = self.cart.increment_line(line.id).await?;
        Ok(format_cart(&cart, &self.display))
    }

    async fn decrement(&mut self) -> Result<String> {
        let line = self.pick_line().await?;
        match self.cart.decrement_line(line.id, line.quantity).await? {
            CartUpdate::Updated(cart) => Ok(format_cart(&cart, &self.display)),
            _ => Ok(format!("There is only one {}. Use '{REMOVE_ITEM}' to take it out.", line.name)),
        }
    }

    async fn remove_item(&mut self) -> Result<String> {
        let line = self.pick_line().await?;
        match self.cart.remove_line(line.id, &self.prompt).await? {
            CartUpdate::Updated(cart) => Ok(format_cart(&cart, &self.display)),
            _ => Ok(format!("{} stays in your cart", line.name)),
        }
    }

    async fn apply_coupon(&mut self) -> Result<String> {
        let code = Input::<String>::new().with_prompt("Coupon code").allow_empty(true).interact_text()?;
        let cart = self.cart.apply_coupon(&code).await?;
        Ok(format_cart(&cart, &self.display))
    }

    async fn remove_coupon(&mut self) -> Result<String> {
        match self.cart.remove_coupon(&self.prompt).await? {
            CartUpdate::Updated(cart) => Ok(format_cart(&cart, &self.display)),
            _ => Ok("The coupon was kept".to_string()),
        }
    }

    async fn select_branch(&mut self) -> Result<String> {
        let branch_id = Input::<i64>::new().with_prompt("Branch id").interact_text()?;
        let cart = self.cart.select_branch(branch_id.into()).await?;
        Ok(format_cart(&cart, &self.display))
    }

    //------------------------------------------  Checkout  -----------------------------------------------------------
    async fn checkout(&mut self) -> Result<String> {
        let checkout = CheckoutApi::new(self.backend.clone(), self.profile.clone());
        let summary = match checkout.enter().await? {
            CheckoutStep::Ready(summary) => summary,
            CheckoutStep::Redirect(nav) => return Ok(self.follow(nav)),
        };
        println!("{}", format_checkout_summary(&summary, &self.display));
        match checkout.confirm(&self.prompt).await? {
            CheckoutStep::Ready(_) => Ok("Your order was not placed".to_string()),
            CheckoutStep::Redirect(Navigation::OrderTracking(order_id)) => {
                self.cart.invalidate().await;
                println!("Order {order_id} placed. Press Ctrl-C to stop tracking.");
                Ok(track_with_spinner(&self.tracker, order_id, &self.display).await?)
            },
            CheckoutStep::Redirect(nav) => Ok(self.follow(nav)),
        }
    }

    fn follow(&mut self, nav: Navigation) -> String {
        match &nav {
            Navigation::Cart { .. } => {
                self.breadcrumbs = vec![top_menu()];
                self.select_menu(cart_menu());
            },
            Navigation::Home { .. } => {
                self.breadcrumbs = vec![top_menu()];
                self.current_menu = top_menu();
            },
            Navigation::OrderTracking(_) | Navigation::Login => {},
        }
        nav.to_string()
    }

    //------------------------------------------  Payments  -----------------------------------------------------------
    async fn view_payments(&mut self) -> Result<String> {
        let methods = self.payments.load().await?;
        let selected = self.payments.selected().await;
        Ok(format_payment_methods(&methods, selected.as_ref()))
    }

    async fn choose_payment(&mut self) -> Result<String> {
        let methods = self.payments.load().await?;
        let items = methods.iter().map(|m| m.to_string()).collect::<Vec<String>>();
        let i = FuzzySelect::new().with_prompt("Pay with").items(&items).interact()?;
        self.payments.select(methods[i].id).await?;
        let method = self.payments.confirm().await?;
        Ok(format!("You will pay with {method}"))
    }

    async fn remove_card(&mut self) -> Result<String> {
        let cards = self.payments.load().await?.into_iter().filter(|m| !m.is_cash()).collect::<Vec<_>>();
        if cards.is_empty() {
            return Ok("You have no stored cards".to_string());
        }
        let items = cards.iter().map(|m| m.to_string()).collect::<Vec<String>>();
        let i = FuzzySelect::new().with_prompt("Remove which card?").items(&items).interact()?;
        if self.payments.delete(cards[i].id, &self.prompt).await? {
            Ok(format!("{} removed", cards[i]))
        } else {
            Ok("The card was kept".to_string())
        }
    }

    //------------------------------------------   Orders   -----------------------------------------------------------
    async fn my_orders(&mut self) -> Result<String> {
        let orders = self.tracker.my_orders().await?;
        Ok(format_orders(&orders, &self.display))
    }

    async fn track_order(&mut self) -> Result<String> {
        let order_id = Input::<String>::new().with_prompt("Order number").interact_text()?;
        let order_id = order_id.parse::<OrderId>()?;
        println!("Press Ctrl-C to stop tracking.");
        Ok(track_with_spinner(&self.tracker, order_id, &self.display).await?)
    }

    //------------------------------------------  Currency  -----------------------------------------------------------
    async fn exchange_rate(&mut self) -> Result<String> {
        let mode = self.display.mode();
        self.display = ExchangeRateApi::new(self.backend.clone()).currency_display().await;
        if mode != self.display.mode() {
            self.display.toggle();
        }
        Ok(format_exchange_rate(self.display.rate()))
    }

    async fn toggle_currency(&mut self) -> Result<String> {
        if !self.display.toggle_available() {
            self.display = ExchangeRateApi::new(self.backend.clone()).currency_display().await;
        }
        if !self.display.toggle_available() {
            return Ok(format_exchange_rate(None));
        }
        Ok(format!("Prices are now shown in {}", self.display.toggle()))
    }

    //------------------------------------------  Session   -----------------------------------------------------------
    fn login(&mut self) -> Result<String> {
        let Some(session) = &self.session else {
            return Ok("Login is not needed in demo mode".to_string());
        };
        let token = Input::<String>::new().with_prompt("Paste your session token").interact_text()?;
        let token = Secret::from(token.trim());
        if token.is_empty() {
            return Ok("No token entered".to_string());
        }
        session.set_token(token.clone());
        self.profile.set_token(&token)?;
        Ok("Logged in".to_string())
    }

    async fn logout(&mut self) -> Result<String> {
        if let Some(session) = &self.session {
            session.clear();
        }
        self.profile.clear_token()?;
        self.cart.invalidate().await;
        Ok("Logged out".to_string())
    }
}

/// Follow an order until it is final, showing each status change on a spinner. Ctrl-C stops following.
pub async fn track_with_spinner<B: OrderManagement>(
    tracker: &OrderTrackerApi<B>,
    order_id: OrderId,
    display: &CurrencyDisplay,
) -> Result<String, CartError> {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    let style = ProgressStyle::with_template("{spinner:5} {msg} [{elapsed}]")
        .map(|s| s.tick_strings(&["🕛 ", "🕐 ", "🕑 ", "🕒 ", "🕓 ", "🕔 ", "🕕 ", "🕖 ", "🕗 ", "🕘 ", "🕙 ", "🕚 "]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(format!("Waiting for order {order_id}..."));
    let on_update = |order: &Order| pb.set_message(format!("Order {}: {}", order.id, order.status));
    let result = tokio::select! {
        res = tracker.track(order_id, on_update) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };
    match result {
        Some(Ok(order)) => {
            pb.finish_with_message("Done!");
            Ok(format_order(&order, display))
        },
        Some(Err(e)) => {
            pb.finish_with_message("Error!");
            Err(e)
        },
        None => {
            pb.finish_with_message("Stopped");
            Ok(format!("Stopped tracking order {order_id}"))
        },
    }
}
