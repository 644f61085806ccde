//! Database operations for the dispatch `PostgreSQL`.
//!
//! ## Tables
//!
//! - `restaurants` - Restaurants and their postal addresses
//! - `product_categories` / `products` - Catalog
//! - `menu_items` - Per-restaurant product availability (unique restaurant + product)
//! - `orders` / `order_items` - Customer orders and their lines
//! - `locations` - Geocoded addresses (unique address, nullable coordinates)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/dispatch/migrations/` and run via:
//! ```bash
//! cargo run -p foodcart-cli -- migrate
//! ```

pub mod locations;
pub mod memory;
pub mod orders;
pub mod restaurants;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::models::{MenuItem, Order, Product, Restaurant};

pub use locations::PgLocationStore;
pub use memory::{DispatchSnapshot, InMemoryDispatchSource};
pub use orders::OrderRepository;
pub use restaurants::RestaurantRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The backing store refused the operation (used by non-SQL stores).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the records a matching pass needs.
///
/// Any error returned here is fatal to the pass.
#[async_trait]
pub trait DispatchSource: Send + Sync {
    /// All restaurants, ordered by name.
    async fn restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError>;

    /// All products, ordered by name.
    async fn products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Menu entries. With `available_only`, entries out of stock are skipped.
    async fn menu_items(&self, available_only: bool) -> Result<Vec<MenuItem>, RepositoryError>;

    /// Orders that still need dispatching, by status then newest first.
    async fn active_orders(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// [`DispatchSource`] backed by the dispatch database.
#[derive(Clone)]
pub struct PgDispatchSource {
    pool: PgPool,
}

impl PgDispatchSource {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchSource for PgDispatchSource {
    async fn restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        RestaurantRepository::new(&self.pool).list_all().await
    }

    async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        RestaurantRepository::new(&self.pool).list_products().await
    }

    async fn menu_items(&self, available_only: bool) -> Result<Vec<MenuItem>, RepositoryError> {
        RestaurantRepository::new(&self.pool)
            .list_menu_items(available_only)
            .await
    }

    async fn active_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list_active().await
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
