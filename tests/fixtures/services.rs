//! In-memory providers for exercising the optimizer without a network.

use std::cell::{Cell, RefCell};

use itinerary_router::error::ServiceError;
use itinerary_router::haversine::great_circle_m;
use itinerary_router::matrix::Travel;
use itinerary_router::model::{Coordinate, RouteDetail, RoutePoint, Strategy, TravelMode};
use itinerary_router::polyline::Polyline;
use itinerary_router::traits::{DistanceService, RouteDetailService};

/// Average speed used to derive durations, in metres per second.
pub const SPEED_MPS: f64 = 10.0;

/// Great-circle distances, durations at [`SPEED_MPS`]. Counts calls.
#[derive(Debug, Default)]
pub struct GreatCircleService {
    pub calls: Cell<usize>,
}

impl GreatCircleService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DistanceService for GreatCircleService {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        _mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        self.calls.set(self.calls.get() + 1);
        Ok(origins
            .iter()
            .map(|o| {
                destinations
                    .iter()
                    .map(|d| {
                        let metres = great_circle_m(*o, *d).round();
                        Travel::reachable(metres, (metres / SPEED_MPS).round())
                    })
                    .collect()
            })
            .collect())
    }
}

/// Explicit distances between known points. Durations are distance / [`SPEED_MPS`].
///
/// `None` marks a pair as unreachable. Unknown coordinates are a provider error.
#[derive(Debug)]
pub struct TableService {
    points: Vec<Coordinate>,
    distances: Vec<Vec<Option<f64>>>,
}

impl TableService {
    pub fn new(points: &[RoutePoint], distances: Vec<Vec<Option<f64>>>) -> Self {
        Self {
            points: points.iter().map(|p| p.coordinate).collect(),
            distances,
        }
    }

    /// Symmetric table from the upper triangle `(i, j, metres)` entries.
    pub fn symmetric(points: &[RoutePoint], pairs: &[(usize, usize, f64)]) -> Self {
        let n = points.len();
        let mut distances = vec![vec![None; n]; n];
        for i in 0..n {
            distances[i][i] = Some(0.0);
        }
        for &(i, j, metres) in pairs {
            distances[i][j] = Some(metres);
            distances[j][i] = Some(metres);
        }
        Self::new(points, distances)
    }

    fn index_of(&self, c: &Coordinate) -> Result<usize, ServiceError> {
        self.points
            .iter()
            .position(|p| p.identity() == c.identity())
            .ok_or_else(|| ServiceError::Provider(format!("unknown coordinate {},{}", c.lat, c.lng)))
    }
}

impl DistanceService for TableService {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        _mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        let mut grid = Vec::with_capacity(origins.len());
        for o in origins {
            let i = self.index_of(o)?;
            let mut row = Vec::with_capacity(destinations.len());
            for d in destinations {
                let j = self.index_of(d)?;
                row.push(match self.distances[i][j] {
                    Some(metres) => Travel::reachable(metres, metres / SPEED_MPS),
                    None => Travel::Unreachable,
                });
            }
            grid.push(row);
        }
        Ok(grid)
    }
}

/// Delegates to `inner` but fails the `fail_on`-th call (0-based) and any
/// batch that touches a poisoned coordinate.
#[derive(Debug)]
pub struct FailingService<S> {
    pub inner: S,
    pub calls: Cell<usize>,
    fail_on: Option<usize>,
    poisoned: Vec<Coordinate>,
}

impl<S> FailingService<S> {
    pub fn on_call(inner: S, fail_on: usize) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
            fail_on: Some(fail_on),
            poisoned: Vec::new(),
        }
    }

    pub fn touching(inner: S, poisoned: &[RoutePoint]) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
            fail_on: None,
            poisoned: poisoned.iter().map(|p| p.coordinate).collect(),
        }
    }
}

impl<S: DistanceService> DistanceService for FailingService<S> {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_on == Some(call) {
            return Err(ServiceError::Unavailable(format!("call {} rejected", call)));
        }
        let touches = |c: &Coordinate| self.poisoned.iter().any(|p| p.identity() == c.identity());
        if origins.iter().chain(destinations).any(touches) {
            return Err(ServiceError::Provider("quota exceeded".to_string()));
        }
        self.inner.distances(origins, destinations, mode)
    }
}

/// One recorded route-detail request.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub waypoints: Vec<Coordinate>,
    pub strategy: Strategy,
}

/// Records route-detail requests and answers with a straight-line path.
/// Requests listed in `fail_calls` (0-based) fail.
#[derive(Debug, Default)]
pub struct RecordingDetails {
    pub requests: RefCell<Vec<DetailRequest>>,
    pub fail_calls: Vec<usize>,
}

impl RecordingDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fail_calls: &[usize]) -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            fail_calls: fail_calls.to_vec(),
        }
    }
}

impl RouteDetailService for RecordingDetails {
    fn route_detail(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
        strategy: Strategy,
    ) -> Result<RouteDetail, ServiceError> {
        let call = {
            let mut requests = self.requests.borrow_mut();
            requests.push(DetailRequest {
                origin,
                destination,
                waypoints: waypoints.to_vec(),
                strategy,
            });
            requests.len() - 1
        };
        if self.fail_calls.contains(&call) {
            return Err(ServiceError::Provider("direction service overloaded".to_string()));
        }

        let mut path = vec![origin];
        path.extend_from_slice(waypoints);
        path.push(destination);
        let distance = path.windows(2).map(|w| great_circle_m(w[0], w[1])).sum::<f64>();
        Ok(RouteDetail {
            distance,
            duration: distance / SPEED_MPS,
            polyline: Polyline::new(path.iter().map(|c| (c.lat, c.lng)).collect()),
            ..RouteDetail::default()
        })
    }
}
