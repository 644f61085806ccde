//! Restaurants, products and menu entries.

use serde::{Deserialize, Serialize};

use foodcart_core::{Price, ProductId, RestaurantId};

/// A restaurant that can prepare orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    /// Postal address, used as the geocode cache key. May be blank.
    pub address: String,
    pub contact_phone: String,
}

/// A product that can appear on restaurant menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: Option<String>,
}

/// One product on one restaurant's menu.
///
/// There is at most one entry per (restaurant, product) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub restaurant_id: RestaurantId,
    pub product_id: ProductId,
    /// Whether the restaurant currently has the product in stock.
    pub availability: bool,
}
