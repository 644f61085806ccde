//! Per-restaurant product availability.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use foodcart_core::{ProductId, RestaurantId};

use crate::models::{MenuItem, Product, Restaurant};

/// Products each restaurant currently has in stock.
///
/// Rebuilt for every matching pass from the menu snapshot. Restaurants with
/// nothing in stock are absent and behave as having an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuAvailabilityIndex {
    by_restaurant: HashMap<RestaurantId, HashSet<ProductId>>,
}

impl MenuAvailabilityIndex {
    /// Build the index from menu entries, keeping only available ones.
    #[must_use]
    pub fn build<'a, I>(menu_items: I) -> Self
    where
        I: IntoIterator<Item = &'a MenuItem>,
    {
        let mut by_restaurant: HashMap<RestaurantId, HashSet<ProductId>> = HashMap::new();
        for item in menu_items.into_iter().filter(|item| item.availability) {
            by_restaurant
                .entry(item.restaurant_id)
                .or_default()
                .insert(item.product_id);
        }
        Self { by_restaurant }
    }

    /// Products in stock at `restaurant`, if it has any.
    #[must_use]
    pub fn available(&self, restaurant: RestaurantId) -> Option<&HashSet<ProductId>> {
        self.by_restaurant.get(&restaurant)
    }

    /// Whether `restaurant` has every product in `required`.
    ///
    /// An empty requirement is satisfied by any restaurant.
    #[must_use]
    pub fn can_fulfill(&self, restaurant: RestaurantId, required: &HashSet<ProductId>) -> bool {
        required.is_empty()
            || self
                .available(restaurant)
                .is_some_and(|available| available.is_superset(required))
    }

    /// Number of restaurants with at least one product in stock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_restaurant.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_restaurant.is_empty()
    }
}

/// One row of the product availability grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductAvailability {
    pub product_id: ProductId,
    pub product_name: String,
    /// One flag per restaurant, in the order the restaurants were given.
    pub in_stock: Vec<bool>,
}

/// Product × restaurant availability grid for the staff menu view.
///
/// A restaurant without a menu entry for a product shows `false`.
#[must_use]
pub fn availability_matrix(
    restaurants: &[Restaurant],
    products: &[Product],
    menu_items: &[MenuItem],
) -> Vec<ProductAvailability> {
    let flags: HashMap<(ProductId, RestaurantId), bool> = menu_items
        .iter()
        .map(|item| ((item.product_id, item.restaurant_id), item.availability))
        .collect();

    products
        .iter()
        .map(|product| ProductAvailability {
            product_id: product.id,
            product_name: product.name.clone(),
            in_stock: restaurants
                .iter()
                .map(|restaurant| {
                    flags
                        .get(&(product.id, restaurant.id))
                        .copied()
                        .unwrap_or(false)
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use foodcart_core::Price;

    use super::*;

    const A: RestaurantId = RestaurantId::new(1);
    const B: RestaurantId = RestaurantId::new(2);

    fn item(restaurant: RestaurantId, product: i32, availability: bool) -> MenuItem {
        MenuItem {
            restaurant_id: restaurant,
            product_id: ProductId::new(product),
            availability,
        }
    }

    fn products(ids: &[i32]) -> HashSet<ProductId> {
        ids.iter().copied().map(ProductId::new).collect()
    }

    fn scenario_index() -> MenuAvailabilityIndex {
        MenuAvailabilityIndex::build(&[
            item(A, 1, true),
            item(A, 2, true),
            item(A, 3, true),
            item(B, 1, true),
            item(B, 2, true),
            item(B, 3, false),
        ])
    }

    #[test]
    fn test_superset_is_required() {
        let index = scenario_index();
        assert!(index.can_fulfill(A, &products(&[1, 2])));
        assert!(index.can_fulfill(B, &products(&[1, 2])));
        assert!(index.can_fulfill(A, &products(&[1, 2, 3])));
        assert!(!index.can_fulfill(B, &products(&[1, 2, 3])));
    }

    #[test]
    fn test_unavailable_entries_are_excluded() {
        let index = scenario_index();
        assert_eq!(index.available(B), Some(&products(&[1, 2])));
    }

    #[test]
    fn test_empty_input_builds_empty_index() {
        let empty: [MenuItem; 0] = [];
        let index = MenuAvailabilityIndex::build(&empty);
        assert!(index.is_empty());
        assert!(!index.can_fulfill(A, &products(&[1])));
    }

    #[test]
    fn test_restaurant_with_nothing_in_stock_is_absent() {
        let index = MenuAvailabilityIndex::build(&[item(A, 1, false)]);
        assert_eq!(index.len(), 0);
        assert!(index.available(A).is_none());
        assert!(index.can_fulfill(A, &HashSet::new()));
    }

    #[test]
    fn test_unknown_product_matches_nobody() {
        let index = scenario_index();
        assert!(!index.can_fulfill(A, &products(&[99])));
        assert!(!index.can_fulfill(B, &products(&[1, 99])));
    }

    #[test]
    fn test_availability_matrix_defaults_to_false() {
        let restaurants = vec![
            Restaurant {
                id: A,
                name: "Arbat".to_string(),
                address: String::new(),
                contact_phone: String::new(),
            },
            Restaurant {
                id: B,
                name: "Basmanny".to_string(),
                address: String::new(),
                contact_phone: String::new(),
            },
        ];
        let catalog = vec![
            Product {
                id: ProductId::new(1),
                name: "Cheeseburger".to_string(),
                price: Price::ZERO,
                category: None,
            },
            Product {
                id: ProductId::new(4),
                name: "Milkshake".to_string(),
                price: Price::ZERO,
                category: None,
            },
        ];
        let menu = vec![item(A, 1, true), item(B, 1, false), item(B, 4, true)];

        let grid = availability_matrix(&restaurants, &catalog, &menu);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.first().map(|r| r.in_stock.clone()), Some(vec![true, false]));
        assert_eq!(grid.last().map(|r| r.in_stock.clone()), Some(vec![false, true]));
    }
}
