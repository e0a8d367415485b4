use std::fmt::{self, Display};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::cart_types::CardId;

/// The value the server expects in `metodoPagoId` when the customer pays in cash.
pub const CASH_SENTINEL: &str = "efectivo";
/// The id under which the synthetic cash option is stored locally.
pub const CASH_ID: &str = "cash";

//--------------------------------------   PaymentMethodId    ---------------------------------------------------------
/// Either the synthetic cash option or one of the customer's stored cards.
///
/// Serialises as the string `"cash"` or as the numeric card id, which is the shape of the `id` field in the locally
/// persisted selection. The server never sees `"cash"`: see [`PaymentMethodId::server_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethodId {
    Cash,
    Card(CardId),
}

/// What gets sent to the server to bind a payment method to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPaymentRef {
    Sentinel(&'static str),
    Card(i64),
}

impl PaymentMethodId {
    pub fn is_cash(&self) -> bool {
        matches!(self, Self::Cash)
    }

    pub fn server_value(&self) -> ServerPaymentRef {
        match self {
            Self::Cash => ServerPaymentRef::Sentinel(CASH_SENTINEL),
            Self::Card(id) => ServerPaymentRef::Card(id.value()),
        }
    }
}

impl Display for PaymentMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => f.write_str(CASH_ID),
            Self::Card(id) => write!(f, "{}", id.value()),
        }
    }
}

impl std::str::FromStr for PaymentMethodId {
    type Err = crate::cart_types::IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(CASH_ID) || s.eq_ignore_ascii_case(CASH_SENTINEL) {
            return Ok(Self::Cash);
        }
        s.parse::<CardId>().map(Self::Card)
    }
}

impl Serialize for PaymentMethodId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Cash => serializer.serialize_str(CASH_ID),
            Self::Card(id) => serializer.serialize_i64(id.value()),
        }
    }
}

struct PaymentMethodIdVisitor;

impl<'de> Visitor<'de> for PaymentMethodIdVisitor {
    type Value = PaymentMethodId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"cash\" or a numeric card id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(PaymentMethodId::Card(CardId(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|e| E::custom(format!("Card id {v} is out of range. {e}")))?;
        self.visit_i64(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<PaymentMethodId>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for PaymentMethodId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PaymentMethodIdVisitor)
    }
}

//--------------------------------------     PaymentKind      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    #[serde(rename = "efectivo")]
    Cash,
    #[serde(rename = "tarjeta")]
    Card,
}

//--------------------------------------      StoredCard      ---------------------------------------------------------
/// A card the server has on file for the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCard {
    pub id: CardId,
    pub brand: String,
    pub last_four_digits: String,
    pub alias: Option<String>,
    /// The customer's default card.
    pub principal: bool,
}

//--------------------------------------     PaymentMethod    ---------------------------------------------------------
/// A selectable payment method. This is also the exact object persisted in the local selection slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_four_digits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl PaymentMethod {
    pub fn cash() -> Self {
        Self { id: PaymentMethodId::Cash, kind: PaymentKind::Cash, brand: None, last_four_digits: None, alias: None }
    }

    pub fn is_cash(&self) -> bool {
        self.id.is_cash()
    }
}

impl From<&StoredCard> for PaymentMethod {
    fn from(card: &StoredCard) -> Self {
        Self {
            id: PaymentMethodId::Card(card.id),
            kind: PaymentKind::Card,
            brand: Some(card.brand.clone()),
            last_four_digits: Some(card.last_four_digits.clone()),
            alias: card.alias.clone(),
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_cash() {
            return f.write_str("Cash");
        }
        let brand = self.brand.as_deref().unwrap_or("Card");
        write!(f, "{brand} •••• {}", self.last_four_digits.as_deref().unwrap_or("????"))?;
        if let Some(alias) = &self.alias {
            write!(f, " ({alias})")?;
        }
        Ok(())
    }
}
