//! Integration tests for Foodcart dispatch.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory and mock-HTTP tests
//! cargo test -p foodcart-integration-tests
//!
//! # Including PostgreSQL tests (needs a disposable database)
//! TEST_DATABASE_URL=postgres://localhost/foodcart_test \
//!     cargo test -p foodcart-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `dispatch_board` - End-to-end matching passes over in-memory records
//! - `yandex_geocoder` - Matching through the HTTP geocoder against a mock server
//! - `postgres` - Repositories and location store against a real database
//!
//! This crate holds the shared fixtures.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use foodcart_core::{
    Coordinates, OrderId, OrderStatus, PaymentMethod, Price, ProductId, RestaurantId,
};
use foodcart_dispatch::db::DispatchSnapshot;
use foodcart_dispatch::geocoder::{
    CacheOptions, GeocodeCache, Geocoder, GeocoderError, InMemoryLocationStore, LocationStore,
};
use foodcart_dispatch::models::{MenuItem, Order, OrderLine, Product, Restaurant};

/// Delivery address used by the fixture orders.
pub const ORDER_ADDRESS: &str = "Moscow, Tverskaya 7";
pub const ARBAT_ADDRESS: &str = "Moscow, Arbat 10";
pub const BASMANNY_ADDRESS: &str = "Moscow, Basmannaya 22";
pub const CHISTYE_ADDRESS: &str = "Moscow, somewhere past the ring road";

pub const ARBAT: RestaurantId = RestaurantId::new(1);
pub const BASMANNY: RestaurantId = RestaurantId::new(2);
pub const CHISTYE: RestaurantId = RestaurantId::new(3);

pub const BURGER: ProductId = ProductId::new(1);
pub const FRIES: ProductId = ProductId::new(2);
pub const SHAKE: ProductId = ProductId::new(3);

/// Geocoder answering from a fixed table and counting calls per address.
#[derive(Debug, Default)]
pub struct CountingGeocoder {
    known: HashMap<String, Coordinates>,
    calls: AtomicUsize,
    per_address: std::sync::Mutex<HashMap<String, usize>>,
}

impl CountingGeocoder {
    /// Geocoder knowing the fixture addresses, except [`CHISTYE_ADDRESS`].
    #[must_use]
    pub fn moscow() -> Self {
        Self::with(&[
            (ORDER_ADDRESS, 55.76, 37.60),
            (ARBAT_ADDRESS, 55.75, 37.62),
            (BASMANNY_ADDRESS, 55.80, 37.50),
        ])
    }

    #[must_use]
    pub fn with(entries: &[(&str, f64, f64)]) -> Self {
        Self {
            known: entries
                .iter()
                .filter_map(|(address, lat, lon)| {
                    Coordinates::new(*lat, *lon)
                        .ok()
                        .map(|c| ((*address).to_string(), c))
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Total provider calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Provider calls made for `address`.
    #[must_use]
    pub fn calls_for(&self, address: &str) -> usize {
        self.per_address
            .lock()
            .map(|calls| calls.get(address).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Geocoder for CountingGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.per_address.lock() {
            *calls.entry(address.to_string()).or_default() += 1;
        }
        tokio::task::yield_now().await;
        Ok(self.known.get(address).copied())
    }
}

/// Cache over an in-memory store with default options.
#[must_use]
pub fn memory_cache(geocoder: Arc<dyn Geocoder>) -> GeocodeCache {
    cache_over(Arc::new(InMemoryLocationStore::new()), geocoder)
}

#[must_use]
pub fn cache_over(store: Arc<dyn LocationStore>, geocoder: Arc<dyn Geocoder>) -> GeocodeCache {
    GeocodeCache::new(store, geocoder, CacheOptions::default())
}

#[must_use]
pub fn restaurant(id: RestaurantId, name: &str, address: &str) -> Restaurant {
    Restaurant {
        id,
        name: name.to_string(),
        address: address.to_string(),
        contact_phone: "+74950000000".to_string(),
    }
}

#[must_use]
pub fn product(id: ProductId, name: &str, kopecks: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        price: Price::new(Decimal::new(kopecks, 2)).unwrap_or_default(),
        category: Some("Fast food".to_string()),
    }
}

#[must_use]
pub const fn menu_item(
    restaurant_id: RestaurantId,
    product_id: ProductId,
    availability: bool,
) -> MenuItem {
    MenuItem {
        restaurant_id,
        product_id,
        availability,
    }
}

/// Unassigned new order for `products`, one of each, at [`ORDER_ADDRESS`].
#[must_use]
pub fn order(id: i32, products: &[ProductId], created_on: DateTime<Utc>) -> Order {
    Order {
        id: OrderId::new(id),
        firstname: "Maria".to_string(),
        lastname: "Kuznetsova".to_string(),
        phonenumber: "+79161234567".to_string(),
        address: ORDER_ADDRESS.to_string(),
        status: OrderStatus::New,
        payment_method: PaymentMethod::Cash,
        assigned_restaurant: None,
        note: String::new(),
        created_on,
        items: products
            .iter()
            .map(|product_id| OrderLine {
                product_id: *product_id,
                quantity: 1,
                price: Price::new(Decimal::new(19900, 2)).unwrap_or_default(),
            })
            .collect(),
    }
}

/// Three restaurants around central Moscow.
///
/// - Arbat has burger, fries and shake
/// - Basmanny has burger and fries; its shake is out of stock
/// - Chistye has burger and fries, but its address cannot be geocoded
#[must_use]
pub fn moscow_snapshot(orders: Vec<Order>) -> DispatchSnapshot {
    DispatchSnapshot {
        restaurants: vec![
            restaurant(ARBAT, "Arbat", ARBAT_ADDRESS),
            restaurant(BASMANNY, "Basmanny", BASMANNY_ADDRESS),
            restaurant(CHISTYE, "Chistye Prudy", CHISTYE_ADDRESS),
        ],
        products: vec![
            product(BURGER, "Cheeseburger", 19900),
            product(FRIES, "Fries", 9900),
            product(SHAKE, "Milkshake", 14900),
        ],
        menu_items: vec![
            menu_item(ARBAT, BURGER, true),
            menu_item(ARBAT, FRIES, true),
            menu_item(ARBAT, SHAKE, true),
            menu_item(BASMANNY, BURGER, true),
            menu_item(BASMANNY, FRIES, true),
            menu_item(BASMANNY, SHAKE, false),
            menu_item(CHISTYE, BURGER, true),
            menu_item(CHISTYE, FRIES, true),
        ],
        orders,
    }
}

/// `minutes` ago.
#[must_use]
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}
