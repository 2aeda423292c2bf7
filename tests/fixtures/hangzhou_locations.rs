//! Real Hangzhou locations for realistic test fixtures.
//!
//! Coordinates are approximate WGS84 positions around West Lake.

use itinerary_router::model::{PointCategory, RoutePoint};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self, category: PointCategory) -> RoutePoint {
        RoutePoint::new(self.name, self.lat, self.lng, category)
    }
}

// ============================================================================
// Lodging
// ============================================================================

pub const HOTELS: &[Location] = &[
    Location::new("Four Seasons West Lake", 30.2530, 120.1430),
    Location::new("Shangri-La Hangzhou", 30.2610, 120.1470),
    Location::new("Hyatt Regency Hubin", 30.2590, 120.1640),
];

// ============================================================================
// Attractions
// ============================================================================

pub const ATTRACTIONS: &[Location] = &[
    Location::new("Leifeng Pagoda", 30.2312, 120.1485),
    Location::new("Broken Bridge", 30.2590, 120.1520),
    Location::new("Lingyin Temple", 30.2410, 120.1010),
    Location::new("Su Causeway North", 30.2540, 120.1405),
    Location::new("Six Harmonies Pagoda", 30.2000, 120.1300),
    Location::new("Hefang Street", 30.2420, 120.1690),
    Location::new("China Tea Museum", 30.2340, 120.1260),
    Location::new("Xixi Wetland", 30.2700, 120.0630),
];

// ============================================================================
// Dining
// ============================================================================

pub const RESTAURANTS: &[Location] = &[
    Location::new("Louwailou", 30.2560, 120.1460),
    Location::new("Zhiweiguan", 30.2510, 120.1650),
    Location::new("Grandma's Kitchen Hubin", 30.2580, 120.1630),
    Location::new("Green Tea Restaurant", 30.2640, 120.1620),
    Location::new("Kuiyuanguan", 30.2500, 120.1700),
    Location::new("Xinbailu", 30.2570, 120.1680),
    Location::new("Shanwaishan", 30.2470, 120.1350),
    Location::new("Dragon Well Manor", 30.2300, 120.1250),
    Location::new("Hangzhou Restaurant", 30.2520, 120.1710),
];

// ============================================================================
// Transit
// ============================================================================

pub const STATIONS: &[Location] = &[
    Location::new("Hangzhou Railway Station", 30.2430, 120.1830),
    Location::new("Longxiangqiao Metro", 30.2560, 120.1640),
];

/// A mixed single-day itinerary in presentation order.
pub fn day_trip() -> Vec<RoutePoint> {
    let mut points = vec![HOTELS[0].point(PointCategory::Lodging)];
    points.extend(ATTRACTIONS[..4].iter().map(|l| l.point(PointCategory::Attraction)));
    points.extend(RESTAURANTS[..2].iter().map(|l| l.point(PointCategory::Dining)));
    points.push(STATIONS[0].point(PointCategory::Transit));
    points
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.with_order(i as u32))
        .collect()
}

/// Every fixture location, categorized.
pub fn all_points() -> Vec<RoutePoint> {
    HOTELS
        .iter()
        .map(|l| l.point(PointCategory::Lodging))
        .chain(ATTRACTIONS.iter().map(|l| l.point(PointCategory::Attraction)))
        .chain(RESTAURANTS.iter().map(|l| l.point(PointCategory::Dining)))
        .chain(STATIONS.iter().map(|l| l.point(PointCategory::Transit)))
        .collect()
}
