use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use comanda_common::Colones;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The sales tax applied to every cart, as a percentage of the subtotal (before discounts).
pub const TAX_RATE_PERCENT: i64 = 13;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid identifier: {0}")]
pub struct IdParseError(String);

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().trim_start_matches('#');
                s.parse::<i64>().map(Self).map_err(|e| IdParseError(format!("{s}. {e}")))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifies one line (detalle) of the cart, not the product on it.
    LineId
);
id_type!(ProductId);
id_type!(BranchId);
id_type!(CardId);
id_type!(OrderId);

//--------------------------------------       CartLine       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: LineId,
    pub product_id: ProductId,
    pub name: String,
    /// Always at least 1. A line that would drop to zero is removed instead.
    pub quantity: u32,
    pub unit_price: Colones,
    pub image_url: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Colones {
        self.unit_price * i64::from(self.quantity)
    }
}

//--------------------------------------        Branch        ---------------------------------------------------------
/// A physical pickup location (sucursal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub address: String,
    pub province: String,
}

impl Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.address, self.province)
    }
}

/// How the server refers to the cart's branch. Some responses embed the whole branch, others only carry its id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BranchRef {
    #[default]
    None,
    Id(BranchId),
    Embedded(Branch),
}

//--------------------------------------        Coupon        ---------------------------------------------------------
/// A normalised coupon code: trimmed and upper-cased, never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CouponCode(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Please enter a coupon code")]
pub struct BlankCouponCode;

impl CouponCode {
    pub fn parse(raw: &str) -> Result<Self, BlankCouponCode> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            return Err(BlankCouponCode);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CouponCode {
    type Err = BlankCouponCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub code: CouponCode,
    pub discount: Colones,
}

//--------------------------------------      CartTotals      ---------------------------------------------------------
/// The derived amounts of a cart. The server computes these on every mutation; the client only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub subtotal: Colones,
    pub discount: Colones,
    pub tax: Colones,
    pub total: Colones,
}

impl CartTotals {
    /// Compute totals the way the server does: tax is charged on the full subtotal, not on the discounted amount,
    /// and the discount can never exceed the subtotal.
    pub fn compute(subtotal: Colones, discount: Colones) -> Self {
        let discount = discount.clamp(Colones::ZERO, subtotal.max(Colones::ZERO));
        let tax = subtotal.percent(TAX_RATE_PERCENT);
        let total = subtotal - discount + tax;
        Self { subtotal, discount, tax, total }
    }

    /// True if these totals obey `total = subtotal - discount + tax(subtotal)` with `0 <= discount <= subtotal`.
    pub fn is_consistent(&self) -> bool {
        *self == Self::compute(self.subtotal, self.discount) && self.discount <= self.subtotal
    }
}

//--------------------------------------     CartSnapshot     ---------------------------------------------------------
/// The cart exactly as a backend reports it, before the branch reference has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub branch: BranchRef,
    pub coupon: Option<Coupon>,
    pub totals: CartTotals,
    pub estimated_prep_minutes: u32,
}

//--------------------------------------      CartSession     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSession {
    pub lines: Vec<CartLine>,
    pub branch: Option<Branch>,
    pub coupon: Option<Coupon>,
    pub totals: CartTotals,
    pub estimated_prep_minutes: u32,
}

/// Reasons a cart cannot be submitted for checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutBlocker {
    EmptyCart,
    NoBranch,
}

impl Display for CheckoutBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutBlocker::EmptyCart => write!(f, "Your cart is empty"),
            CheckoutBlocker::NoBranch => write!(f, "Select a pickup branch before checking out"),
        }
    }
}

impl CartSession {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, line_id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the "pay" action is offered at all. An empty cart has nothing to pay for.
    pub fn is_payable(&self) -> bool {
        !self.is_empty()
    }

    /// The first reason this cart cannot be checked out, if any. A missing branch is reported before an empty cart.
    pub fn checkout_blocker(&self) -> Option<CheckoutBlocker> {
        if self.branch.is_none() {
            Some(CheckoutBlocker::NoBranch)
        } else if self.is_empty() {
            Some(CheckoutBlocker::EmptyCart)
        } else {
            None
        }
    }
}

//--------------------------------------      OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Received by the restaurant, not yet started.
    Pending,
    Preparing,
    /// Ready for pickup at the branch.
    Ready,
    Delivered,
    Cancelled,
    /// A status this client does not know about. Kept verbatim so that it can still be shown.
    Unknown(String),
}

impl OrderStatus {
    /// Map the status string used by the REST API. Unknown values are preserved rather than rejected.
    pub fn from_server(value: &str) -> Self {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "pendiente" | "pending" | "recibido" => Self::Pending,
            "en_preparacion" | "en_preparación" | "preparando" | "preparing" => Self::Preparing,
            "listo" | "lista" | "ready" => Self::Ready,
            "entregado" | "entregada" | "completado" | "delivered" => Self::Delivered,
            "cancelado" | "cancelada" | "cancelled" | "canceled" => Self::Cancelled,
            _ => {
                warn!("📦️ Unrecognised order status '{value}'");
                Self::Unknown(value.to_string())
            },
        }
    }

    /// No further status changes are expected once an order is delivered or cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Preparing => write!(f, "Preparing"),
            OrderStatus::Ready => write!(f, "Ready for pickup"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
            OrderStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------         Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Colones,
    pub branch: Option<Branch>,
    pub created_at: Option<DateTime<Utc>>,
    pub estimated_prep_minutes: Option<u32>,
}

impl Order {
    pub fn new(id: OrderId, status: OrderStatus, total: Colones) -> Self {
        Self { id, status, total, branch: None, created_at: None, estimated_prep_minutes: None }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(id: i64, quantity: u32, price: i64) -> CartLine {
        CartLine {
            id: LineId(id),
            product_id: ProductId(id * 10),
            name: format!("Producto {id}"),
            quantity,
            unit_price: Colones::from(price),
            image_url: None,
        }
    }

    #[test]
    fn tax_is_charged_on_the_undiscounted_subtotal() {
        let totals = CartTotals::compute(Colones::from(10_000), Colones::from(2_000));
        assert_eq!(totals.tax, Colones::from(1_300));
        assert_eq!(totals.total, Colones::from(9_300));
        assert!(totals.is_consistent());
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let totals = CartTotals::compute(Colones::from(1_000), Colones::from(5_000));
        assert_eq!(totals.discount, Colones::from(1_000));
        assert_eq!(totals.total, Colones::from(130));
        assert!(!totals.total.is_negative());

        let tampered = CartTotals { total: Colones::from(9_999), ..totals };
        assert!(!tampered.is_consistent());
    }

    #[test]
    fn coupon_codes_are_normalised() {
        assert_eq!(CouponCode::parse("  descuento20 ").unwrap().as_str(), "DESCUENTO20");
        assert_eq!(CouponCode::parse("   "), Err(BlankCouponCode));
        assert_eq!(CouponCode::parse(""), Err(BlankCouponCode));
    }

    #[test]
    fn checkout_blockers() {
        let mut cart = CartSession::default();
        assert_eq!(cart.checkout_blocker(), Some(CheckoutBlocker::NoBranch));
        assert!(!cart.is_payable());
        cart.branch = Some(Branch {
            id: BranchId(3),
            name: "Escazú".into(),
            address: "Centro Comercial".into(),
            province: "San José".into(),
        });
        assert_eq!(cart.checkout_blocker(), Some(CheckoutBlocker::EmptyCart));
        cart.lines.push(line(1, 2, 1_500));
        assert!(cart.is_payable());
        assert_eq!(cart.checkout_blocker(), None);
        cart.branch = None;
        assert_eq!(cart.checkout_blocker(), Some(CheckoutBlocker::NoBranch));
        cart.branch = Some(Branch {
            id: BranchId(3),
            name: "Escazú".into(),
            address: "Centro Comercial".into(),
            province: "San José".into(),
        });
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.line(LineId(1)).map(CartLine::line_total), Some(Colones::from(3_000)));
    }

    #[test]
    fn ids() {
        assert_eq!("#42".parse::<OrderId>().unwrap(), OrderId(42));
        assert_eq!(" 7 ".parse::<LineId>().unwrap(), LineId(7));
        assert!("abc".parse::<CardId>().is_err());
        assert_eq!(OrderId(42).to_string(), "#42");
    }

    #[test]
    fn order_statuses() {
        assert_eq!(OrderStatus::from_server("EN_PREPARACION"), OrderStatus::Preparing);
        assert_eq!(OrderStatus::from_server("en preparación"), OrderStatus::Preparing);
        assert_eq!(OrderStatus::from_server("listo"), OrderStatus::Ready);
        assert!(OrderStatus::from_server("entregado").is_terminal());
        assert!(OrderStatus::from_server("cancelado").is_terminal());
        assert!(!OrderStatus::from_server("pendiente").is_terminal());
        assert_eq!(OrderStatus::from_server("en camino"), OrderStatus::Unknown("en camino".into()));
    }
}
