//! OSRM HTTP adapter for distance batches and route detail.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;
use crate::matrix::Travel;
use crate::model::{Coordinate, RouteDetail, RouteStep, Strategy, TravelMode};
use crate::polyline::{POLYLINE5, Polyline};
use crate::traits::{DistanceService, RouteDetailService};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub driving_profile: String,
    pub walking_profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            driving_profile: "car".to_string(),
            walking_profile: "foot".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    fn profile(&self, mode: TravelMode) -> Result<&str, ServiceError> {
        match mode {
            TravelMode::Driving => Ok(&self.driving_profile),
            TravelMode::Walking => Ok(&self.walking_profile),
            TravelMode::Transit => Err(ServiceError::UnsupportedMode(mode)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, ServiceError> {
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<T>())?;
        Ok(body)
    }
}

impl DistanceService for OsrmClient {
    fn distances(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Vec<Vec<Travel>>, ServiceError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        let profile = self.config.profile(mode)?;
        let coords = join_coords(origins.iter().chain(destinations));
        let sources = join_indices(0..origins.len());
        let targets = join_indices(origins.len()..origins.len() + destinations.len());

        let url = format!(
            "{}/table/v1/{}/{}?sources={}&destinations={}&annotations=duration,distance",
            self.config.base_url, profile, coords, sources, targets
        );

        let body = self.get::<OsrmTableResponse>(url)?;
        table_grid(body, origins.len(), destinations.len())
    }
}

impl RouteDetailService for OsrmClient {
    fn route_detail(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
        _strategy: Strategy,
    ) -> Result<RouteDetail, ServiceError> {
        let stops = std::iter::once(&origin)
            .chain(waypoints)
            .chain(std::iter::once(&destination));
        let url = format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline&steps=true",
            self.config.base_url,
            self.config.driving_profile,
            join_coords(stops)
        );

        let body = self.get::<OsrmRouteResponse>(url)?;
        route_detail_from(body)
    }
}

fn join_coords<'a>(coords: impl Iterator<Item = &'a Coordinate>) -> String {
    coords
        .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn join_indices(indices: std::ops::Range<usize>) -> String {
    indices.map(|i| i.to_string()).collect::<Vec<_>>().join(";")
}

fn check_code(code: &str, message: Option<String>) -> Result<(), ServiceError> {
    if code == "Ok" {
        Ok(())
    } else {
        Err(ServiceError::Provider(format!(
            "{}: {}",
            code,
            message.unwrap_or_default()
        )))
    }
}

fn table_grid(
    body: OsrmTableResponse,
    rows: usize,
    cols: usize,
) -> Result<Vec<Vec<Travel>>, ServiceError> {
    check_code(&body.code, body.message)?;
    let durations = body
        .durations
        .ok_or_else(|| ServiceError::Malformed("table response has no durations".to_string()))?;
    let distances = body
        .distances
        .ok_or_else(|| ServiceError::Malformed("table response has no distances".to_string()))?;

    if durations.len() != rows || distances.len() != rows {
        return Err(ServiceError::Malformed(format!(
            "expected {} table rows, got {}",
            rows,
            durations.len()
        )));
    }

    durations
        .into_iter()
        .zip(distances)
        .map(|(duration_row, distance_row)| {
            if duration_row.len() != cols || distance_row.len() != cols {
                return Err(ServiceError::Malformed(format!(
                    "expected {} table columns, got {}",
                    cols,
                    duration_row.len()
                )));
            }
            Ok(distance_row
                .into_iter()
                .zip(duration_row)
                .map(|cell| match cell {
                    (Some(distance), Some(duration)) => Travel::reachable(distance, duration),
                    _ => Travel::Unreachable,
                })
                .collect::<Vec<_>>())
        })
        .collect()
}

fn route_detail_from(body: OsrmRouteResponse) -> Result<RouteDetail, ServiceError> {
    check_code(&body.code, body.message)?;
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Malformed("route response has no routes".to_string()))?;

    let steps = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| -> Result<RouteStep, ServiceError> {
            let action = match &step.maneuver.modifier {
                Some(modifier) => format!("{} {}", step.maneuver.kind, modifier),
                None => step.maneuver.kind.clone(),
            };
            let instruction = if step.name.is_empty() {
                action.clone()
            } else {
                format!("{} onto {}", action, step.name)
            };
            Ok(RouteStep {
                instruction,
                road: step.name,
                action,
                distance: step.distance,
                duration: step.duration,
                polyline: Polyline::decode(&step.geometry, POLYLINE5)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteDetail {
        distance: route.distance,
        duration: route.duration,
        tolls: 0.0,
        traffic_lights: 0,
        polyline: Polyline::decode(&route.geometry, POLYLINE5)?,
        steps,
    })
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: String,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    duration: f64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    geometry: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    modifier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_grid_maps_nulls_to_unreachable() {
        let body: OsrmTableResponse = serde_json::from_str(
            r#"{
                "code": "Ok",
                "durations": [[0.0, 120.5, null], [118.0, 0.0, 60.0]],
                "distances": [[0.0, 1500.0, null], [1490.0, 0.0, 700.0]]
            }"#,
        )
        .unwrap();

        let grid = table_grid(body, 2, 3).unwrap();
        assert_eq!(grid[0][1], Travel::reachable(1500.0, 120.5));
        assert_eq!(grid[0][2], Travel::Unreachable);
        assert_eq!(grid[1][2], Travel::reachable(700.0, 60.0));
    }

    #[test]
    fn test_table_grid_rejects_error_code() {
        let body: OsrmTableResponse =
            serde_json::from_str(r#"{"code": "InvalidQuery", "message": "Query string malformed"}"#).unwrap();
        let err = table_grid(body, 1, 1).unwrap_err();
        assert!(matches!(err, ServiceError::Provider(ref msg) if msg.contains("InvalidQuery")));
    }

    #[test]
    fn test_table_grid_rejects_wrong_shape() {
        let body: OsrmTableResponse = serde_json::from_str(
            r#"{"code": "Ok", "durations": [[0.0]], "distances": [[0.0]]}"#,
        )
        .unwrap();
        assert!(matches!(table_grid(body, 2, 1), Err(ServiceError::Malformed(_))));
    }

    #[test]
    fn test_route_detail_from_response() {
        let body: OsrmRouteResponse = serde_json::from_str(
            r#"{
                "code": "Ok",
                "routes": [{
                    "distance": 2500.0,
                    "duration": 300.0,
                    "geometry": "_p~iF~ps|U_ulLnnqC",
                    "legs": [{
                        "steps": [
                            {"distance": 2000.0, "duration": 240.0, "name": "Nanshan Road",
                             "geometry": "_p~iF~ps|U", "maneuver": {"type": "depart"}},
                            {"distance": 500.0, "duration": 60.0, "name": "",
                             "geometry": "", "maneuver": {"type": "turn", "modifier": "left"}}
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let detail = route_detail_from(body).unwrap();
        assert_eq!(detail.distance, 2500.0);
        assert_eq!(detail.polyline.points().len(), 2);
        assert_eq!(detail.steps.len(), 2);
        assert_eq!(detail.steps[0].instruction, "depart onto Nanshan Road");
        assert_eq!(detail.steps[1].instruction, "turn left");
        assert_eq!(detail.traffic_lights, 0);
    }

    #[test]
    fn test_transit_is_unsupported() {
        let config = OsrmConfig::default();
        assert!(matches!(
            config.profile(TravelMode::Transit),
            Err(ServiceError::UnsupportedMode(TravelMode::Transit))
        ));
        assert_eq!(config.profile(TravelMode::Walking).unwrap(), "foot");
    }

    #[test]
    fn test_url_fragments() {
        let coords = [Coordinate::new(30.25, 120.15), Coordinate::new(30.26, 120.16)];
        assert_eq!(join_coords(coords.iter()), "120.150000,30.250000;120.160000,30.260000");
        assert_eq!(join_indices(2..5), "2;3;4");
    }
}
