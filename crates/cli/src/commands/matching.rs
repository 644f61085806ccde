//! One-off matching pass.
//!
//! # Usage
//!
//! ```bash
//! # Match active orders from the database and print the dispatch board
//! fc-cli match
//!
//! # Match a JSON snapshot instead (no database needed)
//! fc-cli match --snapshot fixtures/evening-rush.json
//! ```
//!
//! # Environment Variables
//!
//! - `DISPATCH_DATABASE_URL` - Database URL (not needed with `--snapshot`)
//! - `YANDEX_GEOCODER_API_KEY` - Geocoder API key
//!
//! With `--snapshot`, geocoded locations are kept in memory only.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use foodcart_dispatch::config::{ConfigError, DispatchConfig, GeocoderConfig};
use foodcart_dispatch::db::{
    self, DispatchSnapshot, InMemoryDispatchSource, PgDispatchSource, PgLocationStore,
};
use foodcart_dispatch::geocoder::{
    CacheOptions, GeocodeCache, GeocoderError, InMemoryLocationStore, YandexGeocoder,
};
use foodcart_dispatch::services::{DispatchError, DispatchRow, DispatchService};

/// Errors that can occur during a matching run.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Geocoder setup failed: {0}")]
    Geocoder(#[from] GeocoderError),

    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Run one matching pass and print the board as JSON.
///
/// # Errors
///
/// Returns `MatchError` if setup fails or the records cannot be read.
pub async fn run(snapshot: Option<&Path>) -> Result<(), MatchError> {
    let rows = match snapshot {
        Some(path) => from_snapshot(path).await?,
        None => from_database().await?,
    };

    tracing::info!(orders = rows.len(), "Matching complete");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

async fn from_database() -> Result<Vec<DispatchRow>, MatchError> {
    let config = DispatchConfig::from_env()?;

    tracing::info!("Connecting to dispatch database...");
    let pool = db::create_pool(&config.database_url).await?;

    let geocode = GeocodeCache::new(
        Arc::new(PgLocationStore::new(pool.clone())),
        Arc::new(YandexGeocoder::new(&config.geocoder)?),
        config.cache_options(),
    );
    let service = DispatchService::new(Arc::new(PgDispatchSource::new(pool)), geocode);

    Ok(service.dispatch_board().await?)
}

async fn from_snapshot(path: &Path) -> Result<Vec<DispatchRow>, MatchError> {
    dotenvy::dotenv().ok();
    let geocoder = GeocoderConfig::from_env()?;

    tracing::info!(path = %path.display(), "Loading snapshot");
    let contents = tokio::fs::read_to_string(path).await?;
    let snapshot: DispatchSnapshot = serde_json::from_str(&contents)?;

    let geocode = GeocodeCache::new(
        Arc::new(InMemoryLocationStore::new()),
        Arc::new(YandexGeocoder::new(&geocoder)?),
        CacheOptions {
            fetch_timeout: geocoder.timeout,
            ..CacheOptions::default()
        },
    );
    let service = DispatchService::new(Arc::new(InMemoryDispatchSource::new(snapshot)), geocode);

    Ok(service.dispatch_board().await?)
}
