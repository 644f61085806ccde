//! Decimal prices for products and order lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an amount cannot be a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("price must not be negative, got {0}")]
pub struct NegativePrice(pub Decimal);

/// A non-negative amount in the store currency (rubles).
///
/// Order lines capture the product price at the time the order was placed,
/// so later menu price changes do not alter existing order totals.
///
/// Arithmetic saturates at [`Decimal::MAX`] instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount, returning `None` if it is negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (amount >= Decimal::ZERO).then_some(Self(amount))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u16) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = NegativePrice;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or(NegativePrice(amount))
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
