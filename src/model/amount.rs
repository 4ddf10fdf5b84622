//! Amount type for handling monetary values.
//!
//! The service sends and receives amounts as JSON numbers, while people type them with optional
//! currency signs and thousands separators. `Amount` wraps `Decimal` and accepts both forms.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a monetary amount in currency units.
///
/// # Examples
///
/// ```
/// # use tally::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("$1,250.5").unwrap();
/// let b = Amount::from_str("1250.50").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.formatted(), "1,250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Formats with thousands separators and two decimal places, e.g. `12,500.00`.
    pub fn formatted(&self) -> String {
        let sign = if self.0.is_sign_negative() && !self.is_zero() {
            "-"
        } else {
            ""
        };
        let num = self.0.abs().to_f64().unwrap_or_default();
        format!("{sign}{}", format_num::format_num!(",.2", num))
    }

    /// The sum of the two amounts, or `None` if it is too large to represent.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Whether this amount survives the trip through a JSON number unchanged. Whole numbers always
    /// do; anything else must have an exact shortest `f64` form.
    pub fn is_exact_on_wire(&self) -> bool {
        self.wire_integer().is_some() || self.wire_float().is_some()
    }

    fn wire_integer(&self) -> Option<i64> {
        if !self.0.fract().is_zero() {
            return None;
        }
        self.0.to_i64()
    }

    fn wire_float(&self) -> Option<f64> {
        let float = self.0.to_f64()?;
        let back = Decimal::from_str(&float.to_string()).ok()?;
        (back == self.0).then_some(float)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses user input. A leading `$`, commas and surrounding whitespace are ignored. An empty
    /// string is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let unsigned = unsigned.strip_prefix('$').unwrap_or(unsigned);
        let digits = unsigned.replace(',', "");
        let value = Decimal::from_str(&digits).map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.normalize(), f)
    }
}

impl Serialize for Amount {
    /// Amounts travel as JSON numbers. An amount that a JSON number cannot carry exactly is an
    /// error rather than being rounded.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(whole) = self.wire_integer() {
            return serializer.serialize_i64(whole);
        }
        match self.wire_float() {
            Some(float) => serializer.serialize_f64(float),
            None => Err(serde::ser::Error::custom(format!(
                "{self} cannot be sent as a number without losing precision"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    /// Accepts a JSON number or a numeric string. Anything else is rejected.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Decimal::from_f64(v)
            .map(Amount)
            .ok_or_else(|| E::custom(format!("{v} cannot be represented as an amount")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.25").unwrap();
        assert_eq!(amount.value(), dec("50.25"));
    }

    #[test]
    fn test_parse_with_dollar_sign_and_commas() {
        let amount = Amount::from_str("  $1,234,567.89 ").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        let amount = Amount::from_str("-$50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
        assert!(!amount.is_positive());
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("   ").is_err());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Amount::from_str("twelve").is_err());
        assert!(Amount::from_str("12abc").is_err());
    }

    #[test]
    fn test_zero_is_not_positive() {
        let zero = Amount::from_str("0.00").unwrap();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
    }

    #[test]
    fn test_formatted() {
        assert_eq!(Amount::from(12500_i64).formatted(), "12,500.00");
        assert_eq!(Amount::from_str("0.5").unwrap().formatted(), "0.50");
        assert_eq!(Amount::from_str("-1200").unwrap().formatted(), "-1,200.00");
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(Amount::from_str("500.00").unwrap().to_string(), "500");
        assert_eq!(Amount::from_str("12.50").unwrap().to_string(), "12.5");
    }

    #[test]
    fn test_serialize_whole_number() {
        let json = serde_json::to_string(&Amount::from(500_i64)).unwrap();
        assert_eq!(json, "500");
    }

    #[test]
    fn test_serialize_fraction() {
        let json = serde_json::to_string(&Amount::from_str("12.5").unwrap()).unwrap();
        assert_eq!(json, "12.5");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Amount = serde_json::from_str("1500").unwrap();
        let b: Amount = serde_json::from_str("1500.0").unwrap();
        let c: Amount = serde_json::from_str("\"1,500\"").unwrap();
        assert_eq!(a.value(), b.value());
        assert_eq!(a.value(), c.value());
    }

    #[test]
    fn test_deserialize_rejects_non_numeric() {
        assert!(serde_json::from_str::<Amount>("\"lots\"").is_err());
        assert!(serde_json::from_str::<Amount>("true").is_err());
        assert!(serde_json::from_str::<Amount>("null").is_err());
    }

    #[test]
    fn test_checked_add() {
        let total = Amount::from(1_i64).checked_add(Amount::from(2_i64));
        assert_eq!(total, Some(Amount::from(3_i64)));
        let max = Amount::new(Decimal::MAX);
        assert_eq!(max.checked_add(Amount::from(1_i64)), None);
    }

    #[test]
    fn test_serialize_keeps_cents() {
        let json = serde_json::to_string(&Amount::from_str("1234567.89").unwrap()).unwrap();
        assert_eq!(json, "1234567.89");
        let json = serde_json::to_string(&Amount::from_str("0.10").unwrap()).unwrap();
        assert_eq!(json, "0.1");
    }

    #[test]
    fn test_serialize_refuses_to_round() {
        let amount = Amount::from_str("12345678901234567.89").unwrap();
        assert!(!amount.is_exact_on_wire());
        assert!(serde_json::to_string(&amount).is_err());
        assert!(Amount::from_str("12345678901234567").unwrap().is_exact_on_wire());
    }
}
