//! Address geocoding.
//!
//! # Architecture
//!
//! - [`Geocoder`] - one external lookup per call (production: [`YandexGeocoder`])
//! - [`LocationStore`] - persisted lookup results, keyed by address
//! - [`GeocodeCache`] - batch resolution in front of both: an in-process
//!   `moka` cache, single-flight per address, and a pluggable refresh policy
//!
//! Provider failures never escape a batch: the address is recorded as
//! unresolved and the rest of the batch carries on.

pub mod cache;
pub mod store;
pub mod yandex;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{BatchResolution, CacheOptions, GeocodeCache, GeocodeCacheError, RefreshPolicy};
pub use store::{InMemoryLocationStore, LocationStore};
pub use yandex::YandexGeocoder;

use async_trait::async_trait;
use thiserror::Error;

use foodcart_core::Coordinates;

/// Errors that can occur when calling a geocoding provider.
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Request URL could not be built.
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Resolves a postal address to coordinates with a single external call.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `address`.
    ///
    /// Returns `Ok(None)` when the provider has no result for the address.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError>;
}
