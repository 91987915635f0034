//! Type-safe price representation using decimal arithmetic.
//!
//! Course prices are a single non-negative amount in the portal's currency
//! (dollars). Sums are exact, so a selection of `$100` and `$250` totals
//! exactly `$350`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative course price.
///
/// Displays as `$<amount>` with trailing zeros removed, so `350.00` renders
/// as `$350` and `99.50` as `$99.5`.
///
/// ```
/// use rust_decimal::Decimal;
/// use student_portal_core::Price;
///
/// let a = Price::new(Decimal::new(100, 0)).unwrap();
/// let b = Price::new(Decimal::new(25000, 2)).unwrap();
/// assert_eq!((a + b).to_string(), "$350");
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0.normalize())
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

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dollars(n: i64) -> Price {
        Price::new(Decimal::new(n, 0)).unwrap()
    }

    #[test]
    fn test_display_strips_trailing_zeros() {
        assert_eq!(Price::new(Decimal::new(35000, 2)).unwrap().to_string(), "$350");
        assert_eq!(Price::new(Decimal::new(9950, 2)).unwrap().to_string(), "$99.5");
        assert_eq!(Price::ZERO.to_string(), "$0");
    }

    #[test]
    fn test_sum() {
        let total: Price = [dollars(100), dollars(250)].iter().sum();
        assert_eq!(total, dollars(350));
        assert_eq!(total.to_string(), "$350");
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: Price = Vec::<Price>::new().into_iter().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 0)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_deserialize_from_json_number_and_string() {
        let from_number: Price = serde_json::from_str("149.99").unwrap();
        assert_eq!(from_number.amount(), Decimal::new(14999, 2));

        let from_string: Price = serde_json::from_str("\"250\"").unwrap();
        assert_eq!(from_string, dollars(250));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-10").is_err());
    }
}
