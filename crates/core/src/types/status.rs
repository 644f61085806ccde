//! Order status and payment method enums.
//!
//! Both are stored as `SMALLINT` columns; the discriminants below are the
//! stored values and must not be renumbered.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored small-integer value did not map to any variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: i16,
}

/// Order processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, not yet handled by staff.
    #[default]
    New = 0,
    /// Confirmed with the customer.
    Confirmed = 1,
    Canceled = 2,
    Fulfilled = 3,
}

impl OrderStatus {
    /// Whether the order still needs dispatching (shown on the dispatch board).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::New | Self::Confirmed)
    }

    /// Stored database value.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for OrderStatus {
    type Error = UnknownVariant;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::New),
            1 => Ok(Self::Confirmed),
            2 => Ok(Self::Canceled),
            3 => Ok(Self::Fulfilled),
            _ => Err(UnknownVariant {
                kind: "order status",
                value,
            }),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Canceled => write!(f, "canceled"),
            Self::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    NotSelected = 0,
    Cash = 1,
    Online = 2,
}

impl PaymentMethod {
    /// Stored database value.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for PaymentMethod {
    type Error = UnknownVariant;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotSelected),
            1 => Ok(Self::Cash),
            2 => Ok(Self::Online),
            _ => Err(UnknownVariant {
                kind: "payment method",
                value,
            }),
        }
    }
}
