//! Nearest-neighbor sequencing over a distance matrix.
//!
//! All functions here are pure. Orders are expressed as indices into the
//! matrix, which are the positions of the points in the input slice.

use crate::matrix::{DistanceMatrix, Travel};
use crate::model::Strategy;

/// Weight of kilometers in the balanced cost.
pub const BALANCED_DISTANCE_WEIGHT: f64 = 0.6;
/// Weight of minutes in the balanced cost.
pub const BALANCED_DURATION_WEIGHT: f64 = 0.4;

impl Strategy {
    /// Cost of traversing `travel` under this strategy, `None` if unreachable.
    pub fn edge_cost(&self, travel: Travel) -> Option<f64> {
        let (distance_m, duration_s) = travel.magnitudes()?;
        Some(match self {
            Strategy::Shortest => distance_m,
            Strategy::Fastest => duration_s,
            Strategy::Balanced => {
                BALANCED_DISTANCE_WEIGHT * (distance_m / 1000.0)
                    + BALANCED_DURATION_WEIGHT * (duration_s / 60.0)
            }
        })
    }
}

/// Compute a visiting order over every point of `matrix`.
///
/// With `preserve_start_end` and more than two points, the first and last
/// indices stay in place and only the interior is reordered.
pub fn sequence(
    matrix: &DistanceMatrix,
    strategy: Strategy,
    preserve_start_end: bool,
) -> Vec<usize> {
    let n = matrix.size();
    if n <= 2 {
        return (0..n).collect();
    }

    if preserve_start_end {
        let interior = (1..n - 1).collect::<Vec<_>>();
        let mut order = Vec::with_capacity(n);
        order.push(0);
        order.extend(nearest_neighbor(matrix, &interior, strategy));
        order.push(n - 1);
        order
    } else {
        let all = (0..n).collect::<Vec<_>>();
        nearest_neighbor(matrix, &all, strategy)
    }
}

/// Greedy nearest-neighbor over `nodes`, starting at `nodes[0]`.
///
/// `nodes` holds matrix indices; the result is a permutation of it. Ties go
/// to the candidate that appears first in `nodes`. When every remaining
/// candidate is unreachable, the first remaining one is taken.
pub fn nearest_neighbor(
    matrix: &DistanceMatrix,
    nodes: &[usize],
    strategy: Strategy,
) -> Vec<usize> {
    let Some(&start) = nodes.first() else {
        return Vec::new();
    };

    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    visited[0] = true;
    order.push(start);
    let mut current = start;

    for _ in 1..nodes.len() {
        let mut best: Option<(usize, f64)> = None;
        let mut fallback: Option<usize> = None;

        for (local, &candidate) in nodes.iter().enumerate() {
            if visited[local] {
                continue;
            }
            fallback.get_or_insert(local);
            if let Some(cost) = strategy.edge_cost(matrix.get(current, candidate)) {
                if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                    best = Some((local, cost));
                }
            }
        }

        let Some(next) = best.map(|(local, _)| local).or(fallback) else {
            break;
        };
        visited[next] = true;
        current = nodes[next];
        order.push(current);
    }

    order
}

/// Total `(distance_m, duration_s)` along consecutive pairs of `order`.
///
/// `None` if any leg is unreachable.
pub fn route_totals(matrix: &DistanceMatrix, order: &[usize]) -> Option<(f64, f64)> {
    order.windows(2).try_fold((0.0, 0.0), |(distance, duration), pair| {
        let (d, t) = matrix.get(pair[0], pair[1]).magnitudes()?;
        Some((distance + d, duration + t))
    })
}

/// First consecutive pair of `order` with no route between them.
pub fn first_unreachable_leg(matrix: &DistanceMatrix, order: &[usize]) -> Option<(usize, usize)> {
    order
        .windows(2)
        .find(|pair| matrix.get(pair[0], pair[1]) == Travel::Unreachable)
        .map(|pair| (pair[0], pair[1]))
}
