//! Structural checks over an optimization result.
//!
//! Validation never mutates the route and never calls out; findings are
//! advisory and returned to the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, OptimizedRoute, RoutePoint};

/// Fraction of the original distance a regression may reach before it is
/// reported as anomalous.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ValidationIssue {
    LengthMismatch { original: usize, optimized: usize },
    /// In the original order but not the optimized one.
    MissingPoint { name: String, coordinate: Coordinate },
    /// In the optimized order but not the original one.
    UnexpectedPoint { name: String, coordinate: Coordinate },
    NegativeDistance { value: f64 },
    NegativeDuration { value: f64 },
    /// The optimized route is longer than the original by an unusual margin.
    AnomalousRegression { extra_distance: f64, original_distance: f64 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                original,
                optimized,
            } => write!(
                f,
                "optimized route has {} points but the original has {}",
                optimized, original
            ),
            Self::MissingPoint { name, coordinate } => write!(
                f,
                "point `{}` ({}, {}) is missing from the optimized route",
                name, coordinate.lat, coordinate.lng
            ),
            Self::UnexpectedPoint { name, coordinate } => write!(
                f,
                "point `{}` ({}, {}) does not belong to the original route",
                name, coordinate.lat, coordinate.lng
            ),
            Self::NegativeDistance { value } => write!(f, "total distance is negative ({})", value),
            Self::NegativeDuration { value } => write!(f, "total duration is negative ({})", value),
            Self::AnomalousRegression {
                extra_distance,
                original_distance,
            } => write!(
                f,
                "optimized route is {:.0} m longer than the original {:.0} m",
                extra_distance, original_distance
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

/// Check `route` with the default anomaly threshold.
pub fn validate_optimization(route: &OptimizedRoute) -> ValidationReport {
    validate_with_threshold(route, DEFAULT_ANOMALY_THRESHOLD)
}

/// Check `route`, flagging regressions larger than `anomaly_threshold` of
/// the original distance.
pub fn validate_with_threshold(route: &OptimizedRoute, anomaly_threshold: f64) -> ValidationReport {
    let mut issues = Vec::new();

    if route.optimized_order.len() != route.original_order.len() {
        issues.push(ValidationIssue::LengthMismatch {
            original: route.original_order.len(),
            optimized: route.optimized_order.len(),
        });
    }

    compare_point_sets(&route.original_order, &route.optimized_order, &mut issues);

    if route.total_distance < 0.0 {
        issues.push(ValidationIssue::NegativeDistance {
            value: route.total_distance,
        });
    }
    if route.total_duration < 0.0 {
        issues.push(ValidationIssue::NegativeDuration {
            value: route.total_duration,
        });
    }

    if route.savings.distance < 0.0 {
        let original_distance = route.original_distance();
        let extra_distance = -route.savings.distance;
        if extra_distance > anomaly_threshold * original_distance {
            issues.push(ValidationIssue::AnomalousRegression {
                extra_distance,
                original_distance,
            });
        }
    }

    ValidationReport {
        is_valid: issues.is_empty(),
        issues,
    }
}

fn compare_point_sets(
    original: &[RoutePoint],
    optimized: &[RoutePoint],
    issues: &mut Vec<ValidationIssue>,
) {
    let mut remaining: HashMap<(u64, u64), usize> = HashMap::new();
    for point in original {
        *remaining.entry(point.coordinate.identity()).or_default() += 1;
    }

    let mut unexpected = Vec::new();
    for point in optimized {
        match remaining.get_mut(&point.coordinate.identity()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => unexpected.push(point),
        }
    }

    // Walk the original order again so missing points are reported in input order.
    for point in original {
        if let Some(count) = remaining.get_mut(&point.coordinate.identity()) {
            if *count > 0 {
                *count -= 1;
                issues.push(ValidationIssue::MissingPoint {
                    name: point.name.clone(),
                    coordinate: point.coordinate,
                });
            }
        }
    }

    issues.extend(unexpected.into_iter().map(|point| ValidationIssue::UnexpectedPoint {
        name: point.name.clone(),
        coordinate: point.coordinate,
    }));
}
