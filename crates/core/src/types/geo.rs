//! Geographic coordinates and ranking distances.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing [`Coordinates`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinatesError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A WGS-84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoordinatesError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

impl Coordinates {
    /// Create coordinates, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatesError` if either component is outside its range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinatesError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinatesError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }
}

/// Distance between a delivery address and a restaurant, for ranking.
///
/// `Unknown` is its own ordering class: it compares greater than every
/// known distance, so unresolved restaurants are listed after reachable
/// ones. Known distances compare with `f64::total_cmp`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "Option<f64>", from = "Option<f64>")]
pub enum Distance {
    /// Great-circle distance in kilometers.
    Known(f64),
    /// At least one side could not be geocoded.
    Unknown,
}

impl Distance {
    /// Distance in kilometers, if known.
    #[must_use]
    pub const fn km(self) -> Option<f64> {
        match self {
            Self::Known(km) => Some(km),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Round a known distance to three decimal places (meters).
    #[must_use]
    pub fn rounded(self) -> Self {
        match self {
            Self::Known(km) => Self::Known((km * 1000.0).round() / 1000.0),
            Self::Unknown => Self::Unknown,
        }
    }
}

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Distance {}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a.total_cmp(b),
            (Self::Known(_), Self::Unknown) => Ordering::Less,
            (Self::Unknown, Self::Known(_)) => Ordering::Greater,
            (Self::Unknown, Self::Unknown) => Ordering::Equal,
        }
    }
}

impl From<Distance> for Option<f64> {
    fn from(distance: Distance) -> Self {
        distance.km()
    }
}

impl From<Option<f64>> for Distance {
    fn from(km: Option<f64>) -> Self {
        km.map_or(Self::Unknown, Self::Known)
    }
}
