//! Great-circle distance helpers.
//!
//! Used only to estimate the length of days that have no computed route.
//! Never a stand-in for the distance service.

use crate::model::{Coordinate, RoutePoint};

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two coordinates in meters.
pub fn great_circle_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Sum of great-circle distances between consecutive points.
pub fn path_length_m(points: &[RoutePoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| great_circle_m(pair[0].coordinate, pair[1].coordinate))
        .sum()
}
