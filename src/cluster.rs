//! Multi-day partitioning of trip points.
//!
//! Points are dealt out to days category by category. This is a
//! deterministic, non-geographic heuristic; per-day sequencing orders
//! whatever lands in a bucket.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;
use crate::haversine::path_length_m;
use crate::model::{
    DayPlan, DayStatus, MultiDayItinerary, OptimizedRoute, PointCategory, RoutePoint,
    TripOptimization,
};
use crate::throttle::Throttle;

/// Gap between the optimization of successive days.
pub const DEFAULT_INTER_DAY_DELAY: Duration = Duration::from_secs(1);

/// Points handed to each day per round, by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterQuotas {
    pub lodging: usize,
    pub attraction: usize,
    pub dining: usize,
    pub transit: usize,
}

impl Default for ClusterQuotas {
    fn default() -> Self {
        Self {
            lodging: 1,
            attraction: 1,
            dining: 3, // roughly one day's meals
            transit: 1,
        }
    }
}

impl ClusterQuotas {
    pub fn for_category(&self, category: PointCategory) -> usize {
        let quota = match category {
            PointCategory::Lodging => self.lodging,
            PointCategory::Attraction => self.attraction,
            PointCategory::Dining => self.dining,
            PointCategory::Transit => self.transit,
        };
        quota.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct DayClusterer {
    quotas: ClusterQuotas,
    inter_day_delay: Duration,
}

impl Default for DayClusterer {
    fn default() -> Self {
        Self::new(ClusterQuotas::default())
    }
}

impl DayClusterer {
    pub fn new(quotas: ClusterQuotas) -> Self {
        Self {
            quotas,
            inter_day_delay: DEFAULT_INTER_DAY_DELAY,
        }
    }

    pub fn inter_day_delay(mut self, delay: Duration) -> Self {
        self.inter_day_delay = delay;
        self
    }

    /// Split `points` into `days` buckets. Every point lands in exactly one.
    pub fn partition(&self, points: &[RoutePoint], days: usize) -> Vec<Vec<RoutePoint>> {
        if days <= 1 {
            return vec![points.to_vec()];
        }

        let mut buckets = vec![Vec::new(); days];
        for category in PointCategory::ALL {
            let quota = self.quotas.for_category(category);
            let in_category = points.iter().filter(|point| point.category == category);
            for (i, point) in in_category.enumerate() {
                buckets[(i / quota) % days].push(point.clone());
            }
        }
        buckets
    }

    /// Partition `points` and optimize each day in turn with `optimize`.
    ///
    /// Days are processed strictly one after another. A failed day is
    /// reported as unavailable and does not stop the remaining days.
    pub fn plan_days<F>(
        &self,
        points: &[RoutePoint],
        days: usize,
        mut optimize: F,
    ) -> Result<MultiDayItinerary, OptimizeError>
    where
        F: FnMut(&[RoutePoint]) -> Result<OptimizedRoute, OptimizeError>,
    {
        if days == 0 {
            return Err(OptimizeError::InvalidDayCount(days));
        }

        let throttle = Throttle::new(self.inter_day_delay);
        let mut plans = Vec::with_capacity(days);

        for (index, bucket) in self.partition(points, days).into_iter().enumerate() {
            let day = index + 1;
            if bucket.len() < 2 {
                tracing::debug!(day, points = bucket.len(), "day has nothing to sequence");
                plans.push(DayPlan {
                    day,
                    points: bucket,
                    route: None,
                    status: DayStatus::TooFewPoints,
                });
                continue;
            }

            match throttle.run(|| optimize(&bucket)) {
                Ok(route) => {
                    tracing::info!(
                        day,
                        points = bucket.len(),
                        distance = route.total_distance,
                        saved = route.savings.distance,
                        "day optimized"
                    );
                    plans.push(DayPlan {
                        day,
                        points: bucket,
                        route: Some(route),
                        status: DayStatus::Optimized,
                    });
                }
                Err(err) => {
                    tracing::warn!(day, error = %err, "day optimization unavailable");
                    plans.push(DayPlan {
                        day,
                        points: bucket,
                        route: None,
                        status: DayStatus::Unavailable {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        let total_optimization = summarize(&plans);
        Ok(MultiDayItinerary {
            days: plans,
            total_optimization,
        })
    }
}

/// Trip-level original-vs-optimized distance across all days.
///
/// Days without a computed route count their great-circle length on both
/// sides, so they never contribute savings.
pub fn summarize(plans: &[DayPlan]) -> TripOptimization {
    let (original_distance, optimized_distance) =
        plans.iter().fold((0.0, 0.0), |(original, optimized), plan| match &plan.route {
            Some(route) => (
                original + route.original_distance(),
                optimized + route.total_distance,
            ),
            None => {
                let estimate = path_length_m(&plan.points);
                (original + estimate, optimized + estimate)
            }
        });

    let distance_saved = original_distance - optimized_distance;
    let percentage = if original_distance > 0.0 {
        distance_saved / original_distance * 100.0
    } else {
        0.0
    };

    TripOptimization {
        original_distance,
        optimized_distance,
        distance_saved,
        percentage,
    }
}
