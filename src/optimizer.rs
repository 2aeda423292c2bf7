//! Route optimization entry point.
//!
//! [`RouteOptimizer`] wires the matrix builder, sequencer, clusterer and
//! validator together. A request either yields a complete result or an
//! [`OptimizeError`]; zero savings is a successful outcome.

use std::time::Duration;

use crate::cluster::{ClusterQuotas, DEFAULT_INTER_DAY_DELAY, DayClusterer};
use crate::error::OptimizeError;
use crate::matrix::{
    DEFAULT_BATCH_SIZE, DEFAULT_INTER_CALL_DELAY, DistanceMatrix, DistanceMatrixBuilder,
};
use crate::model::{
    Coordinate, MultiDayItinerary, OptimizationOptions, OptimizedRoute, RouteLeg, RoutePoint,
    Savings,
};
use crate::sequencer::{first_unreachable_leg, route_totals, sequence};
use crate::throttle::Throttle;
use crate::traits::{DistanceService, NoRouteDetails, RouteDetailService};
use crate::validator::{DEFAULT_ANOMALY_THRESHOLD, ValidationReport, validate_with_threshold};

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Origins/destinations per distance query.
    pub batch_size: usize,
    /// Gap between successive external calls within one route.
    pub inter_call_delay: Duration,
    /// Gap between optimizing successive days.
    pub inter_day_delay: Duration,
    /// Regression, as a fraction of the original distance, reported as anomalous.
    pub anomaly_threshold: f64,
    pub quotas: ClusterQuotas,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            inter_call_delay: DEFAULT_INTER_CALL_DELAY,
            inter_day_delay: DEFAULT_INTER_DAY_DELAY,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            quotas: ClusterQuotas::default(),
        }
    }
}

impl OptimizerConfig {
    /// No delays between calls. For tests and local providers.
    pub fn without_delays() -> Self {
        Self {
            inter_call_delay: Duration::ZERO,
            inter_day_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteOptimizer<D, R = NoRouteDetails> {
    distance: D,
    details: R,
    config: OptimizerConfig,
}

impl<D: DistanceService> RouteOptimizer<D> {
    pub fn new(distance: D) -> Self {
        Self::with_config(distance, OptimizerConfig::default())
    }

    pub fn with_config(distance: D, config: OptimizerConfig) -> Self {
        Self {
            distance,
            details: NoRouteDetails,
            config,
        }
    }
}

impl<D, R> RouteOptimizer<D, R>
where
    D: DistanceService,
    R: RouteDetailService,
{
    /// Use `details` for turn-by-turn fetches.
    pub fn with_route_details<R2: RouteDetailService>(self, details: R2) -> RouteOptimizer<D, R2> {
        RouteOptimizer {
            distance: self.distance,
            details,
            config: self.config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize the visiting order of `points`.
    pub fn optimize_route(
        &self,
        points: &[RoutePoint],
        options: &OptimizationOptions,
    ) -> Result<OptimizedRoute, OptimizeError> {
        check_points(points)?;

        let coordinates = points.iter().map(|p| p.coordinate).collect::<Vec<_>>();
        let matrix = DistanceMatrixBuilder::new(&self.distance)
            .batch_size(self.config.batch_size)
            .inter_call_delay(self.config.inter_call_delay)
            .build(&coordinates, options.travel_mode)?;

        let order = sequence(&matrix, options.strategy, options.preserve_start_end);
        let optimized = totals_along(&matrix, &order, points)?;

        let identity = (0..points.len()).collect::<Vec<_>>();
        let savings = match route_totals(&matrix, &identity) {
            Some(original) => Savings::between(original, optimized),
            None => {
                tracing::warn!(
                    points = points.len(),
                    "original order has an unreachable leg; savings not computed"
                );
                Savings::default()
            }
        };

        let optimized_order = order.iter().map(|&i| points[i].clone()).collect::<Vec<_>>();
        let legs = if options.fetch_route_details {
            self.fetch_legs(&optimized_order, options)
        } else {
            Vec::new()
        };

        let mut route = OptimizedRoute {
            original_order: points.to_vec(),
            optimized_order,
            total_distance: optimized.0,
            total_duration: optimized.1,
            savings,
            legs,
            advisories: Vec::new(),
        };

        let report = self.validate_optimization(&route);
        for issue in &report.issues {
            tracing::warn!(%issue, "optimization advisory");
        }
        route.advisories = report.issues;

        tracing::info!(
            points = points.len(),
            strategy = %options.strategy,
            mode = %options.travel_mode,
            distance = route.total_distance,
            duration = route.total_duration,
            saved_pct = route.savings.percentage,
            "route optimized"
        );

        Ok(route)
    }

    /// Split `points` over `day_count` days and optimize each day.
    ///
    /// A day whose optimization fails is reported as unavailable; the other
    /// days are still optimized.
    pub fn optimize_multi_day_itinerary(
        &self,
        points: &[RoutePoint],
        day_count: usize,
        options: &OptimizationOptions,
    ) -> Result<MultiDayItinerary, OptimizeError> {
        if day_count == 0 {
            return Err(OptimizeError::InvalidDayCount(day_count));
        }
        check_points(points)?;

        let clusterer =
            DayClusterer::new(self.config.quotas).inter_day_delay(self.config.inter_day_delay);
        let itinerary = clusterer.plan_days(points, day_count, |bucket| {
            self.optimize_route(bucket, options)
        })?;

        tracing::info!(
            days = day_count,
            points = points.len(),
            saved = itinerary.total_optimization.distance_saved,
            "itinerary optimized"
        );
        Ok(itinerary)
    }

    pub fn validate_optimization(&self, route: &OptimizedRoute) -> ValidationReport {
        validate_with_threshold(route, self.config.anomaly_threshold)
    }

    /// Fetch route detail for `order`, one request per leg.
    fn fetch_legs(&self, order: &[RoutePoint], options: &OptimizationOptions) -> Vec<RouteLeg> {
        let last = order.len().saturating_sub(1);
        let span = options
            .max_waypoints
            .map_or(last, |max| max.saturating_add(1))
            .max(1);
        let throttle = Throttle::new(self.config.inter_call_delay);

        let mut legs = Vec::new();
        let mut start = 0;
        while start < last {
            let end = start.saturating_add(span).min(last);
            let waypoints = order[start + 1..end]
                .iter()
                .map(|p| p.coordinate)
                .collect::<Vec<Coordinate>>();

            tracing::debug!(start, end, waypoints = waypoints.len(), "fetching route detail");
            let detail = throttle.run(|| {
                self.details.route_detail(
                    order[start].coordinate,
                    order[end].coordinate,
                    &waypoints,
                    options.strategy,
                )
            });

            let detail = match detail {
                Ok(detail) => Some(detail),
                Err(err) => {
                    tracing::warn!(start, end, error = %err, "route detail unavailable for leg");
                    None
                }
            };
            legs.push(RouteLeg { start, end, detail });
            start = end;
        }
        legs
    }
}

/// Input checks made before any external call.
fn check_points(points: &[RoutePoint]) -> Result<(), OptimizeError> {
    if points.len() < 2 {
        return Err(OptimizeError::TooFewPoints(points.len()));
    }
    if let Some(bad) = points.iter().find(|p| !p.coordinate.is_valid()) {
        return Err(OptimizeError::InvalidCoordinate {
            name: bad.name.clone(),
            lat: bad.coordinate.lat,
            lng: bad.coordinate.lng,
        });
    }
    Ok(())
}

fn totals_along(
    matrix: &DistanceMatrix,
    order: &[usize],
    points: &[RoutePoint],
) -> Result<(f64, f64), OptimizeError> {
    route_totals(matrix, order).ok_or_else(|| {
        let (from, to) = first_unreachable_leg(matrix, order).unwrap_or_default();
        OptimizeError::UnreachableLeg {
            from: points[from].name.clone(),
            to: points[to].name.clone(),
        }
    })
}
