//! Geocoded location storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use foodcart_core::Coordinates;

use super::RepositoryError;
use crate::geocoder::LocationStore;
use crate::models::Location;

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    address: String,
    lat: Option<f64>,
    lon: Option<f64>,
    fetched_on: DateTime<Utc>,
}

impl TryFrom<LocationRow> for Location {
    type Error = RepositoryError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let coordinates = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid coordinates for {:?}: {e}",
                    row.address
                ))
            })?),
            (None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "half-filled coordinates for {:?}",
                    row.address
                )));
            }
        };

        Ok(Self {
            address: row.address,
            coordinates,
            fetched_on: row.fetched_on,
        })
    }
}

/// [`LocationStore`] backed by the `locations` table.
#[derive(Clone)]
pub struct PgLocationStore {
    pool: PgPool,
}

impl PgLocationStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    #[instrument(skip_all, fields(addresses = addresses.len()))]
    async fn load_many(&self, addresses: &[String]) -> Result<Vec<Location>, RepositoryError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r"
            SELECT address, lat, lon, fetched_on
            FROM locations
            WHERE address = ANY($1)
            ",
        )
        .bind(addresses)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip_all, fields(address = %location.address))]
    async fn save(&self, location: &Location) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO locations (address, lat, lon, fetched_on)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (address) DO UPDATE
            SET lat = EXCLUDED.lat, lon = EXCLUDED.lon, fetched_on = EXCLUDED.fetched_on
            ",
        )
        .bind(&location.address)
        .bind(location.coordinates.map(|c| c.lat()))
        .bind(location.coordinates.map(|c| c.lon()))
        .bind(location.fetched_on)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
