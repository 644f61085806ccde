//! Test doubles for the geocoding provider.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use foodcart_core::Coordinates;

use super::{Geocoder, GeocoderError};

/// Geocoder answering from a fixed table and counting its calls.
#[derive(Default)]
pub struct StubGeocoder {
    pub known: HashMap<String, Coordinates>,
    pub failing: HashSet<String>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn with(entries: &[(&str, f64, f64)]) -> Self {
        Self {
            known: entries
                .iter()
                .filter_map(|(address, lat, lon)| {
                    Coordinates::new(*lat, *lon)
                        .ok()
                        .map(|c| ((*address).to_string(), c))
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(address) {
            return Err(GeocoderError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.known.get(address).copied())
    }
}
