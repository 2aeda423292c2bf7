//! Response caching for distance services.
//!
//! The cache is always handed in by the caller; nothing here is global.

use std::fmt;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use crate::error::ServiceError;
use crate::matrix::Travel;
use crate::model::{Coordinate, TravelMode};
use crate::traits::{DistanceService, ResponseCache};

/// Entries a [`MemoryCache`] holds before it starts evicting.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// TTLs above this never expire.
pub const MAX_ENTRY_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl<V> Expiry<String, Entry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// Bounded in-memory [`ResponseCache`] with per-entry expiry.
pub struct MemoryCache<V> {
    entries: Cache<String, Entry<V>>,
}

impl<V: Clone + Send + Sync + 'static> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl<V: Clone + Send + Sync + 'static> MemoryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Live entries, after pending evictions have been applied.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value)
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        let ttl = (ttl <= MAX_ENTRY_TTL).then_some(ttl);
        self.entries.insert(key.to_string(), Entry { value, ttl });
    }
}

/// [`DistanceService`] decorator that answers repeated batches from a cache.
#[derive(Debug)]
pub struct CachedDistanceService<S, C> {
    inner: S,
    cache: C,
    ttl: Duration,
}

impl<S, C> CachedDistanceService<S, C>
where
    S: DistanceService,
    C: ResponseCache<Vec<Vec<Travel>>>,
{
    pub fn new(inner: S, cache: C, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

fn cache_key(origins: &[Coordinate], destinations: &[Coordinate], mode: TravelMode) -> String {
    let join = |coords: &[Coordinate]| {
        coords
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lat, c.lng))
            .collect::<Vec<_>>()
            .join(";")
    };
    format!("{}|{}|{}", mode, join(origins), join(destinations))
}

impl<S, C> DistanceService for CachedDistanceService<S, C>
where
    S: DistanceService,
    C: ResponseCache<Vec<Vec<Travel>>>,
{
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        let key = cache_key(origins, destinations, mode);
        if let Some(grid) = self.cache.get(&key) {
            tracing::debug!(
                %mode,
                origins = origins.len(),
                destinations = destinations.len(),
                "distance cache hit"
            );
            return Ok(grid);
        }

        // Failures are never cached.
        let grid = self.inner.distances(origins, destinations, mode)?;
        self.cache.set(&key, grid.clone(), self.ttl);
        Ok(grid)
    }
}
