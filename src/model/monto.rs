//! Monetary amounts in Chilean pesos.
//!
//! The backend sends decimal fields as strings (`"1500.00"`), older endpoints send plain JSON
//! numbers, and values copied out of the UI look like `"$1.500 CLP"`. `Monto` accepts all of these
//! and always displays in the UI format.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

const CURRENCY: &str = "CLP";

/// Represents an amount of Chilean pesos.
///
/// Pesos are displayed rounded to whole units, with `.` as the thousands separator:
///
/// ```
/// # use minimarket_views::model::Monto;
/// # use std::str::FromStr;
/// let monto = Monto::from_str("1234567.50").unwrap();
/// assert_eq!(monto.to_string(), "$1.234.568 CLP");
/// ```
///
/// Values in display format parse back to the same amount:
///
/// ```
/// # use minimarket_views::model::Monto;
/// # use std::str::FromStr;
/// let a = Monto::from_str("$1.500 CLP").unwrap();
/// let b = Monto::from_str("1500.00").unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monto(Decimal);

impl Monto {
    pub const ZERO: Monto = Monto(Decimal::ZERO);

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

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Divides by `count`, returning zero when `count` is zero.
    pub fn average(&self, count: usize) -> Monto {
        if count == 0 {
            return Monto::ZERO;
        }
        Monto(self.0 / Decimal::from(count))
    }
}

/// An error that can occur when parsing strings into `Monto` values.
pub struct MontoError(rust_decimal::Error);

impl Debug for MontoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for MontoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for MontoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Monto {
    type Err = MontoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Monto::ZERO);
        }

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        // "$1.500 CLP" is display format: '.' groups thousands and ',' marks decimals.
        let display = rest.starts_with('$') || rest.ends_with(CURRENCY);
        let digits = rest
            .trim_start_matches('$')
            .trim_end_matches(CURRENCY)
            .trim();
        let normalized = if display {
            digits.replace('.', "").replace(',', ".")
        } else {
            digits.to_string()
        };

        let value = Decimal::from_str(&normalized).map_err(MontoError)?;
        Ok(Monto(if negative { -value } else { value }))
    }
}

impl Display for Monto {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let grouped = format_num::format_num!(",.0f", rounded.abs().to_f64().unwrap_or_default());
        write!(f, "{sign}${} {CURRENCY}", grouped.replace(',', "."))
    }
}

impl Serialize for Monto {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Same shape the backend uses for decimal fields.
        serializer.serialize_str(&self.0.to_string())
    }
}

struct MontoVisitor;

impl<'de> Visitor<'de> for MontoVisitor {
    type Value = Monto;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a number, a decimal string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Monto, E> {
        Ok(Monto(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Monto, E> {
        Ok(Monto(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Monto, E> {
        Ok(Monto(Decimal::from_f64_retain(v).unwrap_or_default()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Monto, E> {
        Monto::from_str(v).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Monto, E> {
        Ok(Monto::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Monto, E> {
        Ok(Monto::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Monto, D::Error> {
        deserializer.deserialize_any(MontoVisitor)
    }
}

impl<'de> Deserialize<'de> for Monto {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MontoVisitor)
    }
}

impl From<Decimal> for Monto {
    fn from(value: Decimal) -> Self {
        Monto::new(value)
    }
}

impl From<Monto> for Decimal {
    fn from(monto: Monto) -> Self {
        monto.value()
    }
}

impl Add for Monto {
    type Output = Monto;

    fn add(self, rhs: Monto) -> Monto {
        Monto(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Monto {
    fn add_assign(&mut self, rhs: Monto) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Mul<Decimal> for Monto {
    type Output = Monto;

    fn mul(self, rhs: Decimal) -> Monto {
        Monto(self.0.saturating_mul(rhs))
    }
}

impl std::iter::Sum for Monto {
    fn sum<I: Iterator<Item = Monto>>(iter: I) -> Monto {
        iter.fold(Monto::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_backend_decimal() {
        let monto = Monto::from_str("1500.00").unwrap();
        assert_eq!(monto.value(), dec("1500"));
    }

    #[test]
    fn test_parse_display_format() {
        let monto = Monto::from_str("$1.234.567 CLP").unwrap();
        assert_eq!(monto.value(), dec("1234567"));
    }

    #[test]
    fn test_parse_display_with_decimal_comma() {
        let monto = Monto::from_str("$1.500,50").unwrap();
        assert_eq!(monto.value(), dec("1500.50"));
    }

    #[test]
    fn test_parse_negative_display() {
        let monto = Monto::from_str("-$2.000 CLP").unwrap();
        assert_eq!(monto.value(), dec("-2000"));
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(Monto::from_str("   ").unwrap(), Monto::ZERO);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Monto::from_str("mucho").is_err());
    }

    #[test]
    fn test_display_rounds_to_whole_pesos() {
        assert_eq!(Monto::new(dec("999.5")).to_string(), "$1.000 CLP");
        assert_eq!(Monto::new(dec("999.4")).to_string(), "$999 CLP");
    }

    #[test]
    fn test_display_zero_and_negative() {
        assert_eq!(Monto::ZERO.to_string(), "$0 CLP");
        assert_eq!(Monto::new(dec("-45000")).to_string(), "-$45.000 CLP");
    }

    #[test]
    fn test_deserialize_shapes() {
        let values: Vec<Monto> =
            serde_json::from_str(r#"["1500.00", 1500, 1500.0, null, "$1.500 CLP"]"#).unwrap();
        assert_eq!(values[0].value(), dec("1500"));
        assert_eq!(values[1].value(), dec("1500"));
        assert_eq!(values[2].value(), dec("1500"));
        assert_eq!(values[3], Monto::ZERO);
        assert_eq!(values[4].value(), dec("1500"));
    }

    #[test]
    fn test_serialize_as_decimal_string() {
        let json = serde_json::to_string(&Monto::new(dec("1500.00"))).unwrap();
        assert_eq!(json, "\"1500.00\"");
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(Monto::new(dec("300")).average(0), Monto::ZERO);
        assert_eq!(Monto::new(dec("300")).average(3).value(), dec("100"));
    }

    #[test]
    fn test_sum() {
        let total: Monto = ["100", "250.5", "-50"]
            .iter()
            .map(|s| Monto::from_str(s).unwrap())
            .sum();
        assert_eq!(total.value(), dec("300.5"));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Monto::new(Decimal::MAX);
        assert_eq!((max + max).value(), Decimal::MAX);
        let total: Monto = [max, max, Monto::new(Decimal::ONE)].into_iter().sum();
        assert_eq!(total.value(), Decimal::MAX);
        assert_eq!((max * Decimal::from(3)).value(), Decimal::MAX);
        let mut m = Monto::new(Decimal::MIN);
        m += Monto::new(Decimal::MIN);
        assert_eq!(m.value(), Decimal::MIN);
    }
}
