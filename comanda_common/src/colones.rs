use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use thiserror::Error;

use crate::{helpers::group_thousands, op};

pub const CRC_CURRENCY_CODE: &str = "CRC";
pub const CRC_SYMBOL: char = '₡';

//--------------------------------------      Colones       ---------------------------------------------------------
/// An amount of Costa Rican colones, held as a whole number of céntimos.
///
/// The REST API speaks in colones (JSON numbers, occasionally numeric strings); conversions happen at the serde
/// boundary so that all arithmetic in the client is exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Colones(i64);

op!(binary Colones, Add, add);
op!(binary Colones, Sub, sub);
op!(inplace Colones, AddAssign, add_assign);
op!(inplace Colones, SubAssign, sub_assign);
op!(unary Colones, Neg, neg);

impl Mul<i64> for Colones {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Colones {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in colones: {0}")]
pub struct ColonesConversionError(String);

impl Colones {
    pub const ZERO: Colones = Colones(0);

    pub fn from_centimos(centimos: i64) -> Self {
        Self(centimos)
    }

    pub fn from_colones(colones: i64) -> Self {
        Self(colones * 100)
    }

    pub fn centimos(&self) -> i64 {
        self.0
    }

    /// The amount in colones, as a float. Only for display-side conversions; never feed this back into arithmetic.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `percent`% of this amount, rounded half away from zero to the nearest céntimo.
    pub fn percent(&self, percent: i64) -> Self {
        let scaled = self.0 * percent;
        let rounded = if scaled >= 0 { (scaled + 50) / 100 } else { (scaled - 50) / 100 };
        Self(rounded)
    }
}

impl From<i64> for Colones {
    fn from(colones: i64) -> Self {
        Self::from_colones(colones)
    }
}

impl TryFrom<f64> for Colones {
    type Error = ColonesConversionError;

    fn try_from(colones: f64) -> Result<Self, Self::Error> {
        if !colones.is_finite() {
            return Err(ColonesConversionError(format!("{colones} is not a finite number")));
        }
        let centimos = (colones * 100.0).round();
        #[allow(clippy::cast_precision_loss)]
        let (lower, upper) = (i64::MIN as f64, i64::MAX as f64);
        if centimos >= upper || centimos < lower {
            return Err(ColonesConversionError(format!("{colones} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let centimos = centimos as i64;
        Ok(Self(centimos))
    }
}

impl Display for Colones {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = group_thousands(&(abs / 100).to_string());
        match abs % 100 {
            0 => write!(f, "{sign}{CRC_SYMBOL}{whole}"),
            cents => write!(f, "{sign}{CRC_SYMBOL}{whole}.{cents:02}"),
        }
    }
}

impl Serialize for Colones {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

struct ColonesVisitor;

impl<'de> Visitor<'de> for ColonesVisitor {
    type Value = Colones;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount in colones, as a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100).map(Colones).ok_or_else(|| E::custom(format!("{v} colones is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|e| E::custom(format!("{v} colones is out of range. {e}")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Colones::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let value = v.trim().parse::<f64>().map_err(|e| E::custom(format!("Invalid amount '{v}'. {e}")))?;
        self.visit_f64(value)
    }
}

impl<'de> Deserialize<'de> for Colones {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ColonesVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Colones::from(10_000).to_string(), "₡10,000");
        assert_eq!(Colones::from(0).to_string(), "₡0");
        assert_eq!(Colones::from_centimos(125_050).to_string(), "₡1,250.50");
        assert_eq!(Colones::from_centimos(5).to_string(), "₡0.05");
        assert_eq!((-Colones::from(2_000)).to_string(), "-₡2,000");
    }

    #[test]
    fn arithmetic() {
        let mut a = Colones::from(10_000);
        a -= Colones::from(2_000);
        assert_eq!(a, Colones::from(8_000));
        assert_eq!(Colones::from(1_500) * 3, Colones::from(4_500));
        let total: Colones = [Colones::from(1), Colones::from_centimos(50)].into_iter().sum();
        assert_eq!(total.centimos(), 150);
    }

    #[test]
    fn percentages_round_to_the_nearest_centimo() {
        assert_eq!(Colones::from(10_000).percent(13), Colones::from(1_300));
        // 13% of ₡0.50 is 6.5 céntimos
        assert_eq!(Colones::from_centimos(50).percent(13), Colones::from_centimos(7));
        assert_eq!(Colones::from_centimos(-50).percent(13), Colones::from_centimos(-7));
    }

    #[test]
    fn from_float() {
        assert_eq!(Colones::try_from(4_550.5).unwrap(), Colones::from_centimos(455_050));
        assert!(Colones::try_from(f64::NAN).is_err());
        assert!(Colones::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn serde_round_trip_accepts_numbers_and_strings() {
        let amounts: Vec<Colones> = serde_json::from_str(r#"[10000, 4550.5, "1300.00", 0]"#).unwrap();
        assert_eq!(amounts, vec![
            Colones::from(10_000),
            Colones::from_centimos(455_050),
            Colones::from(1_300),
            Colones::ZERO
        ]);
        assert_eq!(serde_json::to_string(&Colones::from(9_300)).unwrap(), "9300");
        assert_eq!(serde_json::to_string(&Colones::from_centimos(455_050)).unwrap(), "4550.5");
        assert!(serde_json::from_str::<Colones>(r#""diez""#).is_err());
    }
}
