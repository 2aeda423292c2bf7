//! Data model for itinerary optimization.
//!
//! Everything here is transient: built per request from caller input and
//! handed back to the caller, who owns the result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;
use crate::polyline::Polyline;
use crate::validator::ValidationIssue;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Bitwise identity key, used where points are compared as a multiset.
    /// `-0.0` and `0.0` share a key.
    pub fn identity(&self) -> (u64, u64) {
        let bits = |v: f64| if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() };
        (bits(self.lat), bits(self.lng))
    }
}

/// What kind of stop a point is. Drives multi-day quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointCategory {
    #[serde(alias = "hotel")]
    Lodging,
    Attraction,
    #[serde(alias = "restaurant")]
    Dining,
    #[serde(alias = "transport")]
    Transit,
}

impl PointCategory {
    /// Order in which categories are dealt out to days.
    pub const ALL: [PointCategory; 4] = [
        PointCategory::Lodging,
        PointCategory::Attraction,
        PointCategory::Dining,
        PointCategory::Transit,
    ];
}

impl FromStr for PointCategory {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lodging" | "hotel" => Ok(Self::Lodging),
            "attraction" => Ok(Self::Attraction),
            "dining" | "restaurant" => Ok(Self::Dining),
            "transit" | "transport" => Ok(Self::Transit),
            _ => Err(OptimizeError::UnknownCategory(s.to_string())),
        }
    }
}

/// A stop on the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub name: String,
    pub coordinate: Coordinate,
    pub category: PointCategory,
    /// Original presentation order. Not an optimization input.
    pub order: u32,
}

impl RoutePoint {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64, category: PointCategory) -> Self {
        Self {
            name: name.into(),
            coordinate: Coordinate::new(lat, lng),
            category,
            order: 0,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

/// Cost function used to compare candidate next stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Shortest,
    Fastest,
    #[default]
    Balanced,
}

impl FromStr for Strategy {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" => Ok(Self::Shortest),
            "fastest" => Ok(Self::Fastest),
            "balanced" => Ok(Self::Balanced),
            _ => Err(OptimizeError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shortest => "shortest",
            Self::Fastest => "fastest",
            Self::Balanced => "balanced",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Transit,
}

impl FromStr for TravelMode {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" => Ok(Self::Driving),
            "walking" => Ok(Self::Walking),
            "transit" => Ok(Self::Transit),
            _ => Err(OptimizeError::UnknownTravelMode(s.to_string())),
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Transit => "transit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationOptions {
    pub strategy: Strategy,
    pub travel_mode: TravelMode,
    /// Hold the first and last input points in place.
    pub preserve_start_end: bool,
    /// Maximum intermediate waypoints per route-detail request.
    pub max_waypoints: Option<usize>,
    /// Fetch turn-by-turn detail for the optimized order.
    pub fetch_route_details: bool,
}

impl OptimizationOptions {
    /// Build options from the string values used at API boundaries.
    pub fn parse(strategy: &str, travel_mode: &str) -> Result<Self, OptimizeError> {
        Ok(Self {
            strategy: strategy.parse()?,
            travel_mode: travel_mode.parse()?,
            ..Self::default()
        })
    }

    pub fn preserving_start_end(mut self) -> Self {
        self.preserve_start_end = true;
        self
    }

    pub fn with_route_details(mut self, max_waypoints: Option<usize>) -> Self {
        self.fetch_route_details = true;
        self.max_waypoints = max_waypoints;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Savings {
    /// Meters saved; negative when the optimized route is longer.
    pub distance: f64,
    /// Seconds saved.
    pub duration: f64,
    /// Distance saved as a percentage of the original distance.
    pub percentage: f64,
}

impl Savings {
    pub fn between(original: (f64, f64), optimized: (f64, f64)) -> Self {
        let distance = original.0 - optimized.0;
        let duration = original.1 - optimized.1;
        let percentage = if original.0 > 0.0 {
            distance / original.0 * 100.0
        } else {
            0.0
        };
        Self {
            distance,
            duration,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub instruction: String,
    pub road: String,
    pub action: String,
    pub distance: f64,
    pub duration: f64,
    pub polyline: Polyline,
}

/// Turn-by-turn detail for one route-detail request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetail {
    pub distance: f64,
    pub duration: f64,
    pub tolls: f64,
    pub traffic_lights: u32,
    pub polyline: Polyline,
    pub steps: Vec<RouteStep>,
}

/// A stretch of the optimized order fetched as one route-detail request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    /// Position of the leg's origin in `optimized_order`.
    pub start: usize,
    /// Position of the leg's destination in `optimized_order`.
    pub end: usize,
    /// `None` when the detail fetch for this leg failed.
    pub detail: Option<RouteDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub original_order: Vec<RoutePoint>,
    pub optimized_order: Vec<RoutePoint>,
    pub total_distance: f64,
    pub total_duration: f64,
    pub savings: Savings,
    pub legs: Vec<RouteLeg>,
    /// Issues the optimizer's own validation pass reported.
    pub advisories: Vec<ValidationIssue>,
}

impl OptimizedRoute {
    /// Distance of the route in its original order.
    pub fn original_distance(&self) -> f64 {
        self.total_distance + self.savings.distance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DayStatus {
    Optimized,
    /// Fewer than two points: nothing to sequence.
    TooFewPoints,
    /// Optimization ran but failed for this day.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based.
    pub day: usize,
    pub points: Vec<RoutePoint>,
    pub route: Option<OptimizedRoute>,
    pub status: DayStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripOptimization {
    pub original_distance: f64,
    pub optimized_distance: f64,
    pub distance_saved: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiDayItinerary {
    pub days: Vec<DayPlan>,
    pub total_optimization: TripOptimization,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_identity_ignores_sign_of_zero() {
        assert_eq!(
            Coordinate::new(0.0, -0.0).identity(),
            Coordinate::new(-0.0, 0.0).identity()
        );
        assert_ne!(
            Coordinate::new(0.0, 1.0).identity(),
            Coordinate::new(0.0, -1.0).identity()
        );
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Shortest".parse::<Strategy>().unwrap(), Strategy::Shortest);
        assert_eq!("balanced".parse::<Strategy>().unwrap(), Strategy::Balanced);
        let err = "scenic".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, OptimizeError::UnknownStrategy(ref s) if s == "scenic"));
    }

    #[test]
    fn test_travel_mode_parsing() {
        assert_eq!("walking".parse::<TravelMode>().unwrap(), TravelMode::Walking);
        assert!(matches!(
            "cycling".parse::<TravelMode>(),
            Err(OptimizeError::UnknownTravelMode(_))
        ));
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!("hotel".parse::<PointCategory>().unwrap(), PointCategory::Lodging);
        assert_eq!("restaurant".parse::<PointCategory>().unwrap(), PointCategory::Dining);
        assert_eq!("transport".parse::<PointCategory>().unwrap(), PointCategory::Transit);
        assert!("museum".parse::<PointCategory>().is_err());
    }

    #[test]
    fn test_options_reject_unknown_values_when_deserializing() {
        let ok: OptimizationOptions =
            serde_json::from_str(r#"{"strategy":"fastest","travelMode":"walking"}"#).unwrap();
        assert_eq!(ok.strategy, Strategy::Fastest);
        assert_eq!(ok.travel_mode, TravelMode::Walking);
        assert!(!ok.preserve_start_end);

        let bad = serde_json::from_str::<OptimizationOptions>(r#"{"strategy":"scenic"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_options_parse() {
        let options = OptimizationOptions::parse("shortest", "transit").unwrap();
        assert_eq!(options.strategy, Strategy::Shortest);
        assert_eq!(options.travel_mode, TravelMode::Transit);
        assert!(OptimizationOptions::parse("shortest", "teleport").is_err());
    }

    #[test]
    fn test_savings_percentage() {
        let savings = Savings::between((1000.0, 600.0), (750.0, 500.0));
        assert_eq!(savings.distance, 250.0);
        assert_eq!(savings.duration, 100.0);
        assert_eq!(savings.percentage, 25.0);

        let none = Savings::between((0.0, 0.0), (0.0, 0.0));
        assert_eq!(none.percentage, 0.0);
    }
}
