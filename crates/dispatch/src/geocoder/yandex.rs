//! Yandex geocoder HTTP client.
//!
//! Request: `GET {base}/1.x/?geocode={address}&apikey={key}&format=json`.
//! The first `featureMember` carries the best match; its `Point.pos` is a
//! space-separated `"lon lat"` pair. An empty member list means the address
//! is unknown to the provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use foodcart_core::Coordinates;

use super::{Geocoder, GeocoderError};
use crate::config::GeocoderConfig;

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct YandexResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: Point,
}

#[derive(Debug, Deserialize)]
struct Point {
    pos: String,
}

// =============================================================================
// YandexGeocoder
// =============================================================================

/// Client for the Yandex geocoder API.
#[derive(Clone)]
pub struct YandexGeocoder {
    inner: Arc<YandexGeocoderInner>,
}

struct YandexGeocoderInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

impl YandexGeocoder {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GeocoderError::Url` if the base URL is invalid, or
    /// `GeocoderError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocoderError> {
        let endpoint = Url::parse(&format!(
            "{}/1.x/",
            config.base_url.trim_end_matches('/')
        ))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout + Duration::from_secs(1))
            .build()?;

        Ok(Self {
            inner: Arc::new(YandexGeocoderInner {
                client,
                endpoint,
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn request_url(&self, address: &str) -> Url {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("geocode", address)
            .append_pair("apikey", self.inner.api_key.expose_secret())
            .append_pair("format", "json");
        url
    }
}

#[async_trait]
impl Geocoder for YandexGeocoder {
    #[instrument(skip(self), fields(address = %address))]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
        let response = self
            .inner
            .client
            .get(self.request_url(address))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GeocoderError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let coordinates = parse_response(&body)?;
        debug!(found = coordinates.is_some(), "Geocoder responded");
        Ok(coordinates)
    }
}

/// Extract the first match's coordinates from a geocoder response body.
fn parse_response(body: &str) -> Result<Option<Coordinates>, GeocoderError> {
    let parsed: YandexResponse =
        serde_json::from_str(body).map_err(|e| GeocoderError::Malformed(e.to_string()))?;

    let Some(member) = parsed.response.collection.members.into_iter().next() else {
        return Ok(None);
    };

    parse_pos(&member.geo_object.point.pos).map(Some)
}

/// Parse a `"lon lat"` position string.
fn parse_pos(pos: &str) -> Result<Coordinates, GeocoderError> {
    let mut parts = pos.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(lon)), Some(Ok(lat)), None) => {
            Coordinates::new(lat, lon).map_err(|e| GeocoderError::Malformed(e.to_string()))
        }
        _ => Err(GeocoderError::Malformed(format!("invalid position {pos:?}"))),
    }
}
