//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use foodcart_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, RestaurantId};

use super::RepositoryError;
use crate::models::{Order, OrderLine};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    firstname: String,
    lastname: String,
    phonenumber: String,
    address: String,
    status: i16,
    payment_method: i16,
    assigned_restaurant_id: Option<i32>,
    note: String,
    created_on: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> Result<Order, RepositoryError> {
        let status = OrderStatus::try_from(self.status)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let payment_method = PaymentMethod::try_from(self.payment_method)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Order {
            id: OrderId::new(self.id),
            firstname: self.firstname,
            lastname: self.lastname,
            phonenumber: self.phonenumber,
            address: self.address,
            status,
            payment_method,
            assigned_restaurant: self.assigned_restaurant_id.map(RestaurantId::new),
            note: self.note,
            created_on: self.created_on,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: i32,
    quantity: i16,
    price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u16::try_from(row.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid quantity {} in order {}",
                    row.quantity, row.order_id
                ))
            })?;
        let price = Price::new(row.price).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "negative line price {} in order {}",
                row.price, row.order_id
            ))
        })?;

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            quantity,
            price,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List new and confirmed orders with their lines.
    ///
    /// Ordered by status (new first), then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a status, quantity or price is invalid.
    pub async fn list_active(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, firstname, lastname, phonenumber, address, status,
                   payment_method, assigned_restaurant_id, note, created_on
            FROM orders
            WHERE status = ANY($1)
            ORDER BY status, created_on DESC
            ",
        )
        .bind(vec![
            OrderStatus::New.as_i16(),
            OrderStatus::Confirmed.as_i16(),
        ])
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let mut items = self.list_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    /// Load order lines for the given orders, grouped by order ID.
    async fn list_items(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderLine>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, product_id, quantity, price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(grouped)
    }
}
