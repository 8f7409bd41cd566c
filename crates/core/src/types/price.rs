//! Type-safe price representation using decimal arithmetic.
//!
//! All storefront money is a single currency (USD). Amounts are kept as
//! [`Decimal`] so cart sums are exact; they only become floats at the wire
//! boundary because the hosted entity store speaks JSON numbers.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount of money in the store currency.
///
/// ## Examples
///
/// ```
/// use tipsy_tank_core::Price;
///
/// let kit = Price::from_cents(4500);
/// assert_eq!(kit.times(2).to_string(), "$90.00");
/// assert!(Price::try_new(rust_decimal::Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn try_new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    ///
    /// Negative input is clamped to zero.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        let cents = if cents < 0 { 0 } else { cents };
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let (lo, mid) = (cents as u32, (cents >> 32) as u32);
        Self(Decimal::from_parts(lo, mid, 0, false, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// This price multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Subtract `other`, stopping at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

// The entity store stores prices as JSON numbers.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::try_new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_cents() {
        assert_eq!(Price::from_cents(4500).to_string(), "$45.00");
        assert_eq!(Price::from_cents(999).to_string(), "$9.99");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Price::try_new(Decimal::new(-500, 2)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::try_new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Price = [Price::from_cents(10), Price::from_cents(20)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(30));
    }

    #[test]
    fn test_saturating_sub() {
        let a = Price::from_cents(7500);
        let b = Price::from_cents(2000);
        assert_eq!(a.saturating_sub(b), Price::from_cents(5500));
        assert_eq!(b.saturating_sub(a), Price::ZERO);
    }

    #[test]
    fn test_deserialize_from_json_number() {
        let price: Price = serde_json::from_str("45").unwrap();
        assert_eq!(price, Price::from_cents(4500));

        let price: Price = serde_json::from_str("9.99").unwrap();
        assert_eq!(price, Price::from_cents(999));

        assert!(serde_json::from_str::<Price>("-1").is_err());
    }

    #[test]
    fn test_serialize_as_json_number() {
        let json = serde_json::to_value(Price::from_cents(2999)).unwrap();
        assert!(json.is_number());
        assert!((json.as_f64().unwrap() - 29.99).abs() < f64::EPSILON);
    }
}
