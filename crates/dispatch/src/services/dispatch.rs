//! Dispatch board service.
//!
//! Each call is one matching pass over a fresh snapshot:
//! 1. Read restaurants, available menu entries and active orders
//! 2. Build the availability index
//! 3. Match every order, resolving addresses through the shared cache
//!
//! Only a failed read aborts the pass. Geocoding problems surface as
//! unknown distances.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use foodcart_core::{OrderId, OrderStatus, PaymentMethod, Price, RestaurantId};

use crate::db::{DispatchSource, RepositoryError};
use crate::eligibility::{
    Assignment, MenuAvailabilityIndex, OrderFulfillmentMatcher, ProductAvailability,
    availability_matrix,
};
use crate::geocoder::GeocodeCache;
use crate::models::Order;

/// Errors that abort a dispatch pass.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Records could not be read.
    #[error("failed to read dispatch data: {0}")]
    Source(#[from] RepositoryError),
}

/// One order on the dispatch board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRow {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub price_total: Price,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
    pub note: String,
    pub created_on: DateTime<Utc>,
    #[serde(flatten)]
    pub assignment: Assignment,
}

impl DispatchRow {
    fn new(order: Order, assignment: Assignment) -> Self {
        let price_total = order.price_total();
        Self {
            id: order.id,
            status: order.status,
            payment_method: order.payment_method,
            price_total,
            firstname: order.firstname,
            lastname: order.lastname,
            phonenumber: order.phonenumber,
            address: order.address,
            note: order.note,
            created_on: order.created_on,
            assignment,
        }
    }
}

/// Column header of the availability grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantColumn {
    pub id: RestaurantId,
    pub name: String,
}

/// Product × restaurant availability grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityBoard {
    pub restaurants: Vec<RestaurantColumn>,
    pub products: Vec<ProductAvailability>,
}

/// Builds dispatch views from a [`DispatchSource`] and a shared [`GeocodeCache`].
#[derive(Clone)]
pub struct DispatchService {
    source: Arc<dyn DispatchSource>,
    geocode: GeocodeCache,
}

impl DispatchService {
    #[must_use]
    pub fn new(source: Arc<dyn DispatchSource>, geocode: GeocodeCache) -> Self {
        Self { source, geocode }
    }

    /// Active orders with their assignment or ranked candidates.
    ///
    /// Rows keep the source order (status, then newest first).
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Source` if any record read fails.
    #[instrument(skip(self))]
    pub async fn dispatch_board(&self) -> Result<Vec<DispatchRow>, DispatchError> {
        let (restaurants, menu_items, orders) = tokio::try_join!(
            self.source.restaurants(),
            self.source.menu_items(true),
            self.source.active_orders(),
        )?;

        let index = MenuAvailabilityIndex::build(&menu_items);
        let report = OrderFulfillmentMatcher::new(&restaurants, &index)
            .match_orders(&orders, &self.geocode)
            .await;

        let unassigned = orders.iter().filter(|o| !o.is_assigned()).count();
        info!(
            orders = orders.len(),
            unassigned,
            restaurants = restaurants.len(),
            "Dispatch board built"
        );

        Ok(orders
            .into_iter()
            .zip(report)
            .map(|(order, entry)| DispatchRow::new(order, entry.assignment))
            .collect())
    }

    /// Which restaurant has which product in stock.
    ///
    /// Restaurants and products are in source order (by name).
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Source` if any record read fails.
    #[instrument(skip(self))]
    pub async fn availability(&self) -> Result<AvailabilityBoard, DispatchError> {
        let (restaurants, products, menu_items) = tokio::try_join!(
            self.source.restaurants(),
            self.source.products(),
            self.source.menu_items(false),
        )?;

        let grid = availability_matrix(&restaurants, &products, &menu_items);

        Ok(AvailabilityBoard {
            restaurants: restaurants
                .into_iter()
                .map(|r| RestaurantColumn {
                    id: r.id,
                    name: r.name,
                })
                .collect(),
            products: grid,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use foodcart_core::ProductId;

    use super::*;
    use crate::db::{DispatchSnapshot, InMemoryDispatchSource};
    use crate::geocoder::testing::StubGeocoder;
    use crate::geocoder::{CacheOptions, InMemoryLocationStore};
    use crate::models::{MenuItem, OrderLine, Product, Restaurant};

    fn snapshot() -> DispatchSnapshot {
        let restaurant = |id: i32, name: &str, address: &str| Restaurant {
            id: RestaurantId::new(id),
            name: name.to_string(),
            address: address.to_string(),
            contact_phone: String::new(),
        };
        let entry = |restaurant: i32, product: i32, availability: bool| MenuItem {
            restaurant_id: RestaurantId::new(restaurant),
            product_id: ProductId::new(product),
            availability,
        };

        DispatchSnapshot {
            restaurants: vec![
                restaurant(1, "Arbat", "Addr-A"),
                restaurant(2, "Basmanny", "Addr-B"),
            ],
            products: vec![
                Product {
                    id: ProductId::new(1),
                    name: "Burger".to_string(),
                    price: Price::ZERO,
                    category: None,
                },
                Product {
                    id: ProductId::new(2),
                    name: "Fries".to_string(),
                    price: Price::ZERO,
                    category: None,
                },
            ],
            menu_items: vec![
                entry(1, 1, true),
                entry(1, 2, true),
                entry(2, 1, true),
                entry(2, 2, false),
            ],
            orders: vec![Order {
                id: OrderId::new(10),
                firstname: "Olga".to_string(),
                lastname: "Smirnova".to_string(),
                phonenumber: "+79005554433".to_string(),
                address: "Addr-O".to_string(),
                status: OrderStatus::New,
                payment_method: PaymentMethod::Cash,
                assigned_restaurant: None,
                note: "ring twice".to_string(),
                created_on: Utc::now(),
                items: vec![
                    OrderLine {
                        product_id: ProductId::new(1),
                        quantity: 2,
                        price: Price::new(Decimal::new(25000, 2)).unwrap(),
                    },
                    OrderLine {
                        product_id: ProductId::new(2),
                        quantity: 1,
                        price: Price::new(Decimal::new(9950, 2)).unwrap(),
                    },
                ],
            }],
        }
    }

    fn service(source: InMemoryDispatchSource, geocoder: &Arc<StubGeocoder>) -> DispatchService {
        let cache = GeocodeCache::new(
            Arc::new(InMemoryLocationStore::new()),
            Arc::clone(geocoder) as Arc<dyn crate::geocoder::Geocoder>,
            CacheOptions::default(),
        );
        DispatchService::new(Arc::new(source), cache)
    }

    fn fixture(geocoder: &Arc<StubGeocoder>) -> DispatchService {
        service(InMemoryDispatchSource::new(snapshot()), geocoder)
    }

    #[tokio::test]
    async fn test_dispatch_board_lists_eligible_restaurants() {
        let geocoder = Arc::new(StubGeocoder::with(&[
            ("Addr-O", 55.76, 37.60),
            ("Addr-A", 55.75, 37.62),
        ]));
        let board = fixture(&geocoder).dispatch_board().await.unwrap();

        let row = board.first().unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(row.price_total.to_string(), "599.50");
        let names: Vec<_> = row
            .assignment
            .candidates()
            .unwrap()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Arbat"]);
    }

    #[tokio::test]
    async fn test_source_failure_is_fatal() {
        let geocoder = Arc::new(StubGeocoder::default());
        let source = InMemoryDispatchSource::new(snapshot());
        source.set_unavailable(true);

        let result = service(source, &geocoder).dispatch_board().await;
        assert!(matches!(result, Err(DispatchError::Source(_))));
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_availability_board_includes_out_of_stock_entries() {
        let geocoder = Arc::new(StubGeocoder::default());
        let board = fixture(&geocoder).availability().await.unwrap();

        assert_eq!(board.restaurants.len(), 2);
        let fries = board.products.last().unwrap();
        assert_eq!(fries.product_name, "Fries");
        assert_eq!(fries.in_stock, vec![true, false]);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_row_serializes_flat() {
        let geocoder = Arc::new(StubGeocoder::default());
        let board = fixture(&geocoder).dispatch_board().await.unwrap();

        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json[0]["id"], 10);
        assert_eq!(json[0]["kind"], "candidates");
        assert_eq!(json[0]["price_total"], "599.50");
    }
}
