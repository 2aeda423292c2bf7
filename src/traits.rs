//! Collaborator interfaces consumed by the optimizer.
//!
//! These are intentionally minimal. The optimizer owns batching, throttling
//! and validation; implementations only answer one request at a time.

use std::time::Duration;

use crate::error::ServiceError;
use crate::matrix::Travel;
use crate::model::{Coordinate, RouteDetail, Strategy, TravelMode};

/// Answers distance/duration queries between batches of coordinates.
///
/// The returned grid is indexed `[origin][destination]` in the order given,
/// and must be exactly `origins.len() x destinations.len()`. A pair the
/// provider cannot route is reported as [`Travel::Unreachable`]; a failed
/// request is an error, never a grid of placeholders.
pub trait DistanceService {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError>;
}

/// Fetches turn-by-turn detail for one origin/destination pair visiting the
/// given waypoints in order.
pub trait RouteDetailService {
    fn route_detail(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
        strategy: Strategy,
    ) -> Result<RouteDetail, ServiceError>;
}

/// Key/value cache with per-entry expiry, injected where reuse of provider
/// responses is wanted.
pub trait ResponseCache<V> {
    fn get(&self, key: &str) -> Option<V>;

    fn set(&self, key: &str, value: V, ttl: Duration);

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<T: DistanceService + ?Sized> DistanceService for &T {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        (**self).distances(origins, destinations, mode)
    }
}

impl<T: RouteDetailService + ?Sized> RouteDetailService for &T {
    fn route_detail(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
        strategy: Strategy,
    ) -> Result<RouteDetail, ServiceError> {
        (**self).route_detail(origin, destination, waypoints, strategy)
    }
}

impl<V, T: ResponseCache<V> + ?Sized> ResponseCache<V> for &T {
    fn get(&self, key: &str) -> Option<V> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        (**self).set(key, value, ttl)
    }

    fn has(&self, key: &str) -> bool {
        (**self).has(key)
    }
}

/// Route-detail service for optimizers that never fetch detail.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouteDetails;

impl RouteDetailService for NoRouteDetails {
    fn route_detail(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
        _waypoints: &[Coordinate],
        _strategy: Strategy,
    ) -> Result<RouteDetail, ServiceError> {
        Err(ServiceError::Unavailable(
            "no route-detail service configured".to_string(),
        ))
    }
}
