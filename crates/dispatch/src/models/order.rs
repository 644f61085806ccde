//! Customer orders.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use foodcart_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, RestaurantId};

/// A customer order with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    /// Delivery address.
    pub address: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Restaurant already preparing the order, if any.
    pub assigned_restaurant: Option<RestaurantId>,
    pub note: String,
    pub created_on: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

/// One ordered product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(deserialize_with = "positive_quantity")]
    pub quantity: u16,
    /// Unit price captured when the order was placed.
    pub price: Price,
}

impl Order {
    /// Distinct products a restaurant must have available to take this order.
    #[must_use]
    pub fn required_products(&self) -> HashSet<ProductId> {
        self.items.iter().map(|line| line.product_id).collect()
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn price_total(&self) -> Price {
        self.items
            .iter()
            .map(|line| line.price.times(line.quantity))
            .sum()
    }

    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.assigned_restaurant.is_some()
    }
}

/// Line quantities start at one, as the `order_items` check does.
fn positive_quantity<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = u16::deserialize(deserializer)?;
    if quantity == 0 {
        return Err(de::Error::invalid_value(
            Unexpected::Unsigned(0),
            &"a quantity of at least 1",
        ));
    }
    Ok(quantity)
}
