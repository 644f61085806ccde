//! Batch address resolution with at most one provider call per address.
//!
//! Lookup order for each address in a batch:
//!
//! 1. In-process `moka` cache
//! 2. [`LocationStore`] (one bulk query for all addresses missed in step 1)
//! 3. [`Geocoder`], in a task of its own per address; concurrent callers
//!    asking for the same address wait on that one lookup
//!
//! Lookup failures (provider error, timeout, no result) are stored as
//! unresolved locations and are not retried. A location that could not be
//! persisted is kept aside (bounded by the cache capacity) and only its
//! persistence is retried on the next request for that address.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use moka::future::Cache;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, instrument, warn};

use foodcart_core::Coordinates;

use super::{Geocoder, LocationStore};
use crate::db::RepositoryError;
use crate::models::Location;

const DEFAULT_CAPACITY: u64 = 10_000;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// When a stored location must be looked up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Stored results are kept forever.
    #[default]
    Never,
    /// Stored results older than this are re-fetched and overwritten.
    MaxAge(Duration),
}

impl RefreshPolicy {
    /// Whether `location` must be fetched again at `now`.
    #[must_use]
    pub fn is_stale(&self, location: &Location, now: DateTime<Utc>) -> bool {
        match self {
            Self::Never => false,
            Self::MaxAge(max_age) => chrono::Duration::from_std(*max_age)
                .is_ok_and(|max_age| now - location.fetched_on > max_age),
        }
    }
}

/// Tuning for [`GeocodeCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Maximum number of addresses kept in memory.
    pub capacity: u64,
    /// Upper bound on a single provider call.
    pub fetch_timeout: Duration,
    pub refresh: RefreshPolicy,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            refresh: RefreshPolicy::Never,
        }
    }
}

/// Per-address failures reported alongside a batch.
///
/// The affected address is unresolved for the current batch only.
#[derive(Debug, Error)]
pub enum GeocodeCacheError {
    /// Stored locations could not be read; no lookup was attempted.
    #[error("failed to load stored locations: {0}")]
    Load(#[source] RepositoryError),

    /// A fetched location could not be persisted.
    #[error("failed to persist location: {0}")]
    Persist(#[source] RepositoryError),

    /// The lookup task ended without producing a result.
    #[error("lookup did not complete: {0}")]
    Interrupted(String),
}

/// Outcome of [`GeocodeCache::resolve`].
#[derive(Debug, Default)]
pub struct BatchResolution {
    locations: HashMap<String, Option<Coordinates>>,
    errors: HashMap<String, Arc<GeocodeCacheError>>,
}

impl BatchResolution {
    /// Coordinates of `address`, or `None` if it is unresolved or was not requested.
    #[must_use]
    pub fn coordinates(&self, address: &str) -> Option<Coordinates> {
        self.locations.get(address).copied().flatten()
    }

    /// Whether `address` was part of the batch.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.locations.contains_key(address)
    }

    /// Addresses that failed for a reason other than the provider.
    #[must_use]
    pub const fn errors(&self) -> &HashMap<String, Arc<GeocodeCacheError>> {
        &self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn insert(&mut self, address: String, coordinates: Option<Coordinates>) {
        self.locations.insert(address, coordinates);
    }

    fn fail(&mut self, address: String, error: Arc<GeocodeCacheError>) {
        self.locations.insert(address.clone(), None);
        self.errors.insert(address, error);
    }
}

// =============================================================================
// GeocodeCache
// =============================================================================

/// Shared address resolver.
///
/// Cheap to clone; clones share the in-memory cache and in-flight lookups.
#[derive(Clone)]
pub struct GeocodeCache {
    inner: Arc<GeocodeCacheInner>,
}

struct GeocodeCacheInner {
    store: Arc<dyn LocationStore>,
    geocoder: Arc<dyn Geocoder>,
    resolved: Cache<String, Location>,
    /// Fetched but not yet persisted, keyed by address.
    unpersisted: Cache<String, Location>,
    /// Lookups currently running, keyed by address.
    in_flight: Mutex<HashMap<String, broadcast::Sender<FetchResult>>>,
    options: CacheOptions,
}

type FetchResult = Result<Location, Arc<GeocodeCacheError>>;

impl GeocodeCache {
    #[must_use]
    pub fn new(
        store: Arc<dyn LocationStore>,
        geocoder: Arc<dyn Geocoder>,
        options: CacheOptions,
    ) -> Self {
        let resolved = Cache::builder().max_capacity(options.capacity).build();
        let unpersisted = Cache::builder().max_capacity(options.capacity).build();

        Self {
            inner: Arc::new(GeocodeCacheInner {
                store,
                geocoder,
                resolved,
                unpersisted,
                in_flight: Mutex::new(HashMap::new()),
                options,
            }),
        }
    }

    /// Resolve every address in `addresses`.
    ///
    /// Never fails as a whole: each address ends up resolved or unresolved,
    /// with non-provider failures listed in [`BatchResolution::errors`].
    /// Missing addresses are fetched concurrently.
    #[instrument(skip_all, fields(addresses = addresses.len()))]
    pub async fn resolve(&self, addresses: &HashSet<String>) -> BatchResolution {
        let now = Utc::now();
        let policy = self.inner.options.refresh;
        let mut batch = BatchResolution::default();
        let mut pending = Vec::new();

        for address in addresses {
            if address.trim().is_empty() {
                batch.insert(address.clone(), None);
                continue;
            }
            match self.inner.resolved.get(address).await {
                Some(location) if !policy.is_stale(&location, now) => {
                    batch.insert(address.clone(), location.coordinates);
                }
                Some(_) => {
                    self.inner.resolved.invalidate(address).await;
                    pending.push(address.clone());
                }
                None => pending.push(address.clone()),
            }
        }

        if pending.is_empty() {
            debug!("All addresses served from memory");
            return batch;
        }

        let stored = match self.inner.store.load_many(&pending).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, count = pending.len(), "Failed to load stored locations");
                let error = Arc::new(GeocodeCacheError::Load(e));
                for address in pending {
                    batch.fail(address, Arc::clone(&error));
                }
                return batch;
            }
        };

        let mut stored: HashMap<String, Location> = stored
            .into_iter()
            .map(|location| (location.address.clone(), location))
            .collect();
        let mut missing = Vec::new();

        for address in pending {
            match stored.remove(&address) {
                Some(location) if !policy.is_stale(&location, now) => {
                    batch.insert(address.clone(), location.coordinates);
                    self.inner.resolved.insert(address, location).await;
                }
                _ => missing.push(address),
            }
        }

        debug!(missing = missing.len(), "Fetching unresolved addresses");

        let fetched = join_all(missing.iter().map(|address| self.fetch_once(address))).await;
        for (address, result) in missing.into_iter().zip(fetched) {
            match result {
                Ok(location) => batch.insert(address, location.coordinates),
                Err(error) => batch.fail(address, error),
            }
        }

        batch
    }

    /// Fetch `address`, joining the lookup already in flight for it if any.
    ///
    /// The lookup runs in its own task, so a caller that is dropped while
    /// waiting neither cancels it nor causes a second provider call.
    async fn fetch_once(&self, address: &str) -> FetchResult {
        let mut receiver = {
            let mut in_flight = self.inner.in_flight.lock().await;
            if let Some(sender) = in_flight.get(address) {
                debug!(address, "Joining in-flight lookup");
                sender.subscribe()
            } else {
                // A lookup that finished after `resolve` checked memory.
                if let Some(location) = self.inner.resolved.get(address).await
                    && !self.inner.options.refresh.is_stale(&location, Utc::now())
                {
                    return Ok(location);
                }

                let (sender, receiver) = broadcast::channel(1);
                in_flight.insert(address.to_string(), sender);
                tokio::spawn(Arc::clone(&self.inner).run_lookup(address.to_string()));
                receiver
            }
        };

        receiver.recv().await.unwrap_or_else(|e| {
            Err(Arc::new(GeocodeCacheError::Interrupted(e.to_string())))
        })
    }
}

impl GeocodeCacheInner {
    /// Fetch and persist `address`, then hand the result to every waiter.
    async fn run_lookup(self: Arc<Self>, address: String) {
        let worker = {
            let inner = Arc::clone(&self);
            let address = address.clone();
            tokio::spawn(async move { inner.fetch_and_store(&address).await })
        };
        let result = match worker.await {
            Ok(result) => result.map_err(Arc::new),
            Err(e) => Err(Arc::new(GeocodeCacheError::Interrupted(e.to_string()))),
        };

        // Published before the in-flight entry goes, so late callers find it.
        if let Ok(location) = &result {
            self.resolved.insert(address.clone(), location.clone()).await;
        }
        let sender = self.in_flight.lock().await.remove(&address);
        if let Some(sender) = sender
            && sender.send(result).is_err()
        {
            debug!(address, "Lookup finished with no callers waiting");
        }
    }

    async fn fetch_and_store(&self, address: &str) -> Result<Location, GeocodeCacheError> {
        let location = match self.unpersisted.remove(address).await {
            Some(location) => {
                debug!(address, "Retrying persistence of fetched location");
                location
            }
            None => Location::new(address.to_string(), self.lookup(address).await, Utc::now()),
        };

        if let Err(e) = self.store.save(&location).await {
            warn!(address, error = %e, "Failed to persist geocoded location");
            self.unpersisted.insert(address.to_string(), location).await;
            return Err(GeocodeCacheError::Persist(e));
        }

        Ok(location)
    }

    /// One provider call, bounded by the configured timeout.
    async fn lookup(&self, address: &str) -> Option<Coordinates> {
        let timeout = self.options.fetch_timeout;
        match tokio::time::timeout(timeout, self.geocoder.geocode(address)).await {
            Ok(Ok(Some(coordinates))) => Some(coordinates),
            Ok(Ok(None)) => {
                debug!(address, "Geocoder found no match");
                None
            }
            Ok(Err(e)) => {
                warn!(address, error = %e, "Geocoding failed");
                None
            }
            Err(_) => {
                warn!(
                    address,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "Geocoding timed out"
                );
                None
            }
        }
    }
}
