//! Geocoded addresses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use foodcart_core::Coordinates;

/// Result of geocoding one address.
///
/// `coordinates` is `None` when the provider failed or found nothing; such
/// rows are kept so the address is not looked up again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub fetched_on: DateTime<Utc>,
}

impl Location {
    #[must_use]
    pub const fn new(
        address: String,
        coordinates: Option<Coordinates>,
        fetched_on: DateTime<Utc>,
    ) -> Self {
        Self {
            address,
            coordinates,
            fetched_on,
        }
    }
}
