//! AMap (Gaode) REST adapter for distance batches and driving directions.
//!
//! A distance batch is a single request: origins and destinations are both
//! `|`-joined and results come back keyed by 1-based origin/destination ids.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::ServiceError;
use crate::matrix::Travel;
use crate::model::{Coordinate, RouteDetail, RouteStep, Strategy, TravelMode};
use crate::polyline::Polyline;
use crate::traits::{DistanceService, RouteDetailService};

#[derive(Debug, Clone)]
pub struct AmapConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Direction queries are slower than distance queries.
    pub route_timeout_secs: u64,
}

impl Default for AmapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://restapi.amap.com".to_string(),
            api_key: None,
            timeout_secs: 10,
            route_timeout_secs: 15,
        }
    }
}

impl AmapConfig {
    /// Read `AMAP_API_KEY` and, if set, `AMAP_BASE_URL`.
    pub fn from_env() -> Self {
        let mut config = Self {
            api_key: std::env::var("AMAP_API_KEY").ok().filter(|key| !key.is_empty()),
            ..Self::default()
        };
        if let Ok(base_url) = std::env::var("AMAP_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct AmapClient {
    config: AmapConfig,
    client: reqwest::blocking::Client,
}

impl AmapClient {
    pub fn new(config: AmapConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Check that the key is accepted by geocoding a well-known address.
    pub fn test_connection(&self) -> Result<(), ServiceError> {
        let body: AmapGeocodeResponse = self.get(
            "/v3/geocode/geo",
            &[("address", "北京市天安门".to_string())],
            self.config.timeout_secs,
        )?;
        check_status(&body.status, &body.info)?;
        if body.geocodes.is_empty() {
            return Err(ServiceError::Provider("geocoder returned no results".to_string()));
        }
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout_secs: u64,
    ) -> Result<T, ServiceError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingApiKey)?;

        let body = self
            .client
            .get(format!("{}{}", self.config.base_url, path))
            .query(&[("key", key), ("output", "json")])
            .query(params)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<T>())?;
        Ok(body)
    }
}

/// AMap distance `type` parameter. Modes it has no code for are measured as driving.
fn distance_type(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "1",
        TravelMode::Walking => "3",
        TravelMode::Transit => "1",
    }
}

/// AMap driving `strategy` parameter.
fn strategy_code(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Fastest => "0",
        Strategy::Shortest => "1",
        Strategy::Balanced => "0",
    }
}

fn lng_lat(c: &Coordinate) -> String {
    format!("{:.6},{:.6}", c.lng, c.lat)
}

fn check_status(status: &str, info: &str) -> Result<(), ServiceError> {
    if status == "1" {
        Ok(())
    } else {
        Err(ServiceError::Provider(info.to_string()))
    }
}

impl DistanceService for AmapClient {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        // One request per batch.
        let body: AmapDistanceResponse = self.get(
            "/v3/distance",
            &distance_params(origins, destinations, mode),
            self.config.timeout_secs,
        )?;
        distance_grid(body, origins.len(), destinations.len())
    }
}

impl RouteDetailService for AmapClient {
    fn route_detail(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
        strategy: Strategy,
    ) -> Result<RouteDetail, ServiceError> {
        let mut params = vec![
            ("origin", lng_lat(&origin)),
            ("destination", lng_lat(&destination)),
            ("strategy", strategy_code(strategy).to_string()),
            ("extensions", "all".to_string()),
        ];
        if !waypoints.is_empty() {
            let joined = waypoints.iter().map(lng_lat).collect::<Vec<_>>().join(";");
            params.push(("waypoints", joined));
        }

        let body: AmapDirectionResponse =
            self.get("/v3/direction/driving", &params, self.config.route_timeout_secs)?;
        route_detail_from(body)
    }
}

fn distance_params(
    origins: &[Coordinate],
    destinations: &[Coordinate],
    mode: TravelMode,
) -> Vec<(&'static str, String)> {
    let join = |coords: &[Coordinate]| coords.iter().map(lng_lat).collect::<Vec<_>>().join("|");
    vec![
        ("origins", join(origins)),
        ("destination", join(destinations)),
        ("type", distance_type(mode).to_string()),
    ]
}

/// Place each result by its 1-based origin and destination ids. Pairs
/// without a usable result are unreachable.
fn distance_grid(
    body: AmapDistanceResponse,
    rows: usize,
    cols: usize,
) -> Result<Vec<Vec<Travel>>, ServiceError> {
    check_status(&body.status, &body.info)?;
    let mut grid = vec![vec![Travel::Unreachable; cols]; rows];
    for result in body.results {
        let row = result.origin_id.checked_sub(1).filter(|i| *i < rows);
        let col = result.dest_id.checked_sub(1).filter(|j| *j < cols);
        let (Some(row), Some(col)) = (row, col) else {
            return Err(ServiceError::Malformed(format!(
                "distance result for unknown pair {} -> {}",
                result.origin_id, result.dest_id
            )));
        };
        if let (Some(distance), Some(duration)) = (result.distance, result.duration) {
            grid[row][col] = Travel::reachable(distance, duration);
        }
    }
    Ok(grid)
}

fn route_detail_from(body: AmapDirectionResponse) -> Result<RouteDetail, ServiceError> {
    check_status(&body.status, &body.info)?;
    let path = body
        .route
        .and_then(|route| route.paths.into_iter().next())
        .ok_or_else(|| ServiceError::Malformed("direction response has no paths".to_string()))?;

    let mut polyline = Polyline::default();
    let steps = path
        .steps
        .into_iter()
        .map(|step| -> Result<RouteStep, ServiceError> {
            let step_line = Polyline::from_lng_lat_pairs(&step.polyline)?;
            polyline.extend(&step_line);
            Ok(RouteStep {
                instruction: step.instruction,
                road: step.road,
                action: step.action,
                distance: step.distance.unwrap_or_default(),
                duration: step.duration.unwrap_or_default(),
                polyline: step_line,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteDetail {
        distance: path.distance.unwrap_or_default(),
        duration: path.duration.unwrap_or_default(),
        tolls: path.tolls.unwrap_or_default(),
        traffic_lights: path.traffic_lights.unwrap_or_default() as u32,
        polyline,
        steps,
    })
}

/// AMap encodes numbers as strings and empty values as `[]`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    lenient_number(deserializer)?
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as usize)
        .ok_or_else(|| serde::de::Error::custom("expected a non-negative integer id"))
}

fn first_id() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct AmapDistanceResponse {
    #[serde(deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    info: String,
    #[serde(default)]
    results: Vec<AmapDistanceResult>,
}

#[derive(Debug, Deserialize)]
struct AmapDistanceResult {
    #[serde(deserialize_with = "lenient_index")]
    origin_id: usize,
    /// Absent when a single destination was queried.
    #[serde(default = "first_id", deserialize_with = "lenient_index")]
    dest_id: usize,
    #[serde(default, deserialize_with = "lenient_number")]
    distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AmapDirectionResponse {
    #[serde(deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    info: String,
    route: Option<AmapRoute>,
}

#[derive(Debug, Deserialize)]
struct AmapRoute {
    #[serde(default)]
    paths: Vec<AmapPath>,
}

#[derive(Debug, Deserialize)]
struct AmapPath {
    #[serde(default, deserialize_with = "lenient_number")]
    distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    tolls: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    traffic_lights: Option<f64>,
    #[serde(default)]
    steps: Vec<AmapStep>,
}

#[derive(Debug, Deserialize)]
struct AmapStep {
    #[serde(default, deserialize_with = "lenient_string")]
    instruction: String,
    #[serde(default, deserialize_with = "lenient_string")]
    road: String,
    #[serde(default, deserialize_with = "lenient_string")]
    action: String,
    #[serde(default, deserialize_with = "lenient_number")]
    distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    polyline: String,
}

#[derive(Debug, Deserialize)]
struct AmapGeocodeResponse {
    #[serde(deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    info: String,
    #[serde(default)]
    geocodes: Vec<serde_json::Value>,
}
