//! Persisted geocoding results.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::RepositoryError;
use crate::models::Location;

/// Storage for [`Location`] rows, keyed by address.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Load the stored locations for any of `addresses`.
    ///
    /// Addresses with no stored row are simply absent from the result.
    async fn load_many(&self, addresses: &[String]) -> Result<Vec<Location>, RepositoryError>;

    /// Insert or overwrite the row for `location.address`.
    async fn save(&self, location: &Location) -> Result<(), RepositoryError>;
}

/// In-memory [`LocationStore`].
///
/// Results live as long as the process. Used by tests and by tools that run
/// without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocationStore {
    rows: Arc<RwLock<HashMap<String, Location>>>,
}

impl InMemoryLocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored row for `address`, if any.
    pub async fn get(&self, address: &str) -> Option<Location> {
        self.rows.read().await.get(address).cloned()
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl LocationStore for InMemoryLocationStore {
    async fn load_many(&self, addresses: &[String]) -> Result<Vec<Location>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(addresses
            .iter()
            .filter_map(|address| rows.get(address).cloned())
            .collect())
    }

    async fn save(&self, location: &Location) -> Result<(), RepositoryError> {
        self.rows
            .write()
            .await
            .insert(location.address.clone(), location.clone());
        Ok(())
    }
}
