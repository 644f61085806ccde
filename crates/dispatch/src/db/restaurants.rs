//! Restaurant and menu repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use foodcart_core::{Price, ProductId, RestaurantId};

use super::RepositoryError;
use crate::models::{MenuItem, Product, Restaurant};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: i32,
    name: String,
    address: String,
    contact_phone: String,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: RestaurantId::new(row.id),
            name: row.name,
            address: row.address,
            contact_phone: row.contact_phone,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    category: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "negative price {} for product {}",
                row.price, row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            category: row.category,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    restaurant_id: i32,
    product_id: i32,
    availability: bool,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            restaurant_id: RestaurantId::new(row.restaurant_id),
            product_id: ProductId::new(row.product_id),
            availability: row.availability,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for restaurants, products and menus.
pub struct RestaurantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RestaurantRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all restaurants ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query_as::<_, RestaurantRow>(
            r"
            SELECT id, name, address, contact_phone
            FROM restaurants
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all products ordered by name, with their category name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a price is negative.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.price, c.name AS category
            FROM products p
            LEFT JOIN product_categories c ON c.id = p.category_id
            ORDER BY p.name, p.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List menu entries, optionally only those currently in stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_menu_items(
        &self,
        available_only: bool,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(
            r"
            SELECT restaurant_id, product_id, availability
            FROM menu_items
            WHERE availability OR NOT $1
            ORDER BY restaurant_id, product_id
            ",
        )
        .bind(available_only)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
