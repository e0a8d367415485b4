use std::fmt::Display;

use crate::{
    cart_api::payment_objects::PaymentMethod,
    cart_types::{CartSession, OrderId},
};

/// A screen change requested by the cart or checkout logic. The front end decides how to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Cart { message: String },
    Home { message: String },
    OrderTracking(OrderId),
    Login,
}

impl Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Navigation::Cart { message } => write!(f, "Back to the cart: {message}"),
            Navigation::Home { message } => write!(f, "Back to the main menu: {message}"),
            Navigation::OrderTracking(id) => write!(f, "Tracking order {id}"),
            Navigation::Login => write!(f, "Log in"),
        }
    }
}

/// What the customer sees on the checkout screen before confirming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub cart: CartSession,
    /// The payment method chosen earlier, if one was saved.
    pub payment: Option<PaymentMethod>,
}

/// The checkout state machine.
///
/// ```text
/// Entering ──> Aborted (terminal, redirect)
///     └──────> Ready <──> Confirming ──> Completed (terminal, redirect to tracking)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Entering,
    Ready(CheckoutSummary),
    Confirming,
    Aborted(Navigation),
    Completed(OrderId),
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted(_) | Self::Completed(_))
    }

    pub fn summary(&self) -> Option<&CheckoutSummary> {
        match self {
            Self::Ready(summary) => Some(summary),
            _ => None,
        }
    }
}

/// The outcome of a checkout transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Checkout is (still) waiting for the customer to confirm.
    Ready(CheckoutSummary),
    /// Checkout is over. Leave for the given screen.
    Redirect(Navigation),
}

/// The outcome of a cart mutation that was allowed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartUpdate {
    /// The server accepted the change and this is the refreshed cart.
    Updated(CartSession),
    /// Nothing needed doing. No request was sent.
    Unchanged,
    /// The customer answered "no" to the confirmation prompt. No request was sent.
    Declined,
}

impl CartUpdate {
    pub fn cart(&self) -> Option<&CartSession> {
        match self {
            Self::Updated(cart) => Some(cart),
            _ => None,
        }
    }
}
