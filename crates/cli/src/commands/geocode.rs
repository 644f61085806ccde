//! Address lookup through the geocode cache.
//!
//! # Usage
//!
//! ```bash
//! # Resolve addresses, reusing and filling the locations table
//! fc-cli geocode "Moscow, Tverskaya 1" "Moscow, Arbat 10"
//!
//! # Resolve without touching the database
//! fc-cli geocode --no-store "Moscow, Tverskaya 1"
//! ```
//!
//! # Environment Variables
//!
//! - `DISPATCH_DATABASE_URL` - Database URL (not needed with `--no-store`)
//! - `YANDEX_GEOCODER_API_KEY` - Geocoder API key

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use foodcart_dispatch::config::{ConfigError, DispatchConfig, GeocoderConfig};
use foodcart_dispatch::db::{self, PgLocationStore};
use foodcart_dispatch::geocoder::{
    CacheOptions, GeocodeCache, GeocoderError, InMemoryLocationStore, YandexGeocoder,
};

/// Errors that can occur during a lookup run.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Geocoder setup failed: {0}")]
    Geocoder(#[from] GeocoderError),

    #[error("No addresses given")]
    NoAddresses,
}

/// Resolve `addresses` and print one line per address.
///
/// Unresolved addresses are printed as such; they are not an error.
///
/// # Errors
///
/// Returns `GeocodeError` if setup fails.
pub async fn run(addresses: &[String], no_store: bool) -> Result<(), GeocodeError> {
    if addresses.is_empty() {
        return Err(GeocodeError::NoAddresses);
    }

    let cache = if no_store {
        dotenvy::dotenv().ok();
        let geocoder = GeocoderConfig::from_env()?;
        GeocodeCache::new(
            Arc::new(InMemoryLocationStore::new()),
            Arc::new(YandexGeocoder::new(&geocoder)?),
            CacheOptions {
                fetch_timeout: geocoder.timeout,
                ..CacheOptions::default()
            },
        )
    } else {
        let config = DispatchConfig::from_env()?;
        let pool = db::create_pool(&config.database_url).await?;
        GeocodeCache::new(
            Arc::new(PgLocationStore::new(pool)),
            Arc::new(YandexGeocoder::new(&config.geocoder)?),
            config.cache_options(),
        )
    };

    let wanted: HashSet<String> = addresses.iter().cloned().collect();
    let batch = cache.resolve(&wanted).await;

    for (address, error) in batch.errors() {
        tracing::warn!(address = %address, error = %error, "Lookup incomplete");
    }

    #[allow(clippy::print_stdout)]
    {
        for address in addresses {
            match batch.coordinates(address) {
                Some(c) => println!("{address}\t{:.6},{:.6}", c.lat(), c.lon()),
                None => println!("{address}\tunresolved"),
            }
        }
    }
    Ok(())
}
