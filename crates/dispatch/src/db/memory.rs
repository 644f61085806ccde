//! In-memory dispatch records.

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{DispatchSource, RepositoryError};
use crate::models::{MenuItem, Order, Product, Restaurant};

/// Every record a dispatch pass reads, as loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DispatchSnapshot {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// [`DispatchSource`] over a [`DispatchSnapshot`].
///
/// Applies the same filtering and ordering as the SQL source. Used by tests
/// and by tools that run without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatchSource {
    snapshot: Arc<RwLock<DispatchSnapshot>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDispatchSource {
    #[must_use]
    pub fn new(snapshot: DispatchSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every read fail with [`RepositoryError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Replace the stored records.
    pub async fn replace(&self, snapshot: DispatchSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory source switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DispatchSource for InMemoryDispatchSource {
    async fn restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        self.check()?;
        let mut restaurants = self.snapshot.read().await.restaurants.clone();
        restaurants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(restaurants)
    }

    async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.check()?;
        let mut products = self.snapshot.read().await.products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn menu_items(&self, available_only: bool) -> Result<Vec<MenuItem>, RepositoryError> {
        self.check()?;
        Ok(self
            .snapshot
            .read()
            .await
            .menu_items
            .iter()
            .filter(|item| item.availability || !available_only)
            .copied()
            .collect())
    }

    async fn active_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        self.check()?;
        let mut orders: Vec<Order> = self
            .snapshot
            .read()
            .await
            .orders
            .iter()
            .filter(|order| order.status.is_active())
            .cloned()
            .collect();
        orders.sort_by_key(|order| (order.status, Reverse(order.created_on)));
        Ok(orders)
    }
}
