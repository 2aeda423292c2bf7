use std::ops::Range;

use thiserror::Error;

use crate::model::TravelMode;

/// Failures reported by an external distance or route-detail service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered but refused the request.
    #[error("provider rejected request: {0}")]
    Provider(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("travel mode `{0}` is not supported by this provider")]
    UnsupportedMode(TravelMode),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Failures while assembling a distance matrix. No partial matrix ever
/// accompanies one of these.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("a distance matrix needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("distance query for rows {rows:?} x columns {cols:?} failed")]
    Query {
        rows: Range<usize>,
        cols: Range<usize>,
        #[source]
        source: ServiceError,
    },

    #[error("distance service returned a {got_rows}x{got_cols} grid for a {rows}x{cols} batch")]
    BatchShape {
        rows: usize,
        cols: usize,
        got_rows: usize,
        got_cols: usize,
    },

    #[error("matrix is not square or contains an invalid cell at ({row}, {col})")]
    InvalidCell { row: usize, col: usize },
}

/// Failures of an optimization request.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("at least two points are required to optimize a route, got {0}")]
    TooFewPoints(usize),

    #[error("day count must be positive, got {0}")]
    InvalidDayCount(usize),

    #[error("point `{name}` has an invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { name: String, lat: f64, lng: f64 },

    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),

    #[error("unknown travel mode `{0}`")]
    UnknownTravelMode(String),

    #[error("unknown point category `{0}`")]
    UnknownCategory(String),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("no route between `{from}` and `{to}`")]
    UnreachableLeg { from: String, to: String },
}

impl OptimizeError {
    /// True for errors raised before any external call was made.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Matrix(_) | Self::UnreachableLeg { .. })
    }
}
