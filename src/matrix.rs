//! Distance matrix acquisition.
//!
//! [`DistanceMatrixBuilder`] splits a point set into row and column batches,
//! queries the [`DistanceService`] once per batch pair through a
//! [`Throttle`], and assembles a complete [`DistanceMatrix`]. Any failed
//! batch fails the whole build.

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MatrixError;
use crate::model::{Coordinate, TravelMode};
use crate::throttle::Throttle;
use crate::traits::DistanceService;

/// Largest batch the distance service accepts per axis.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Gap between successive distance queries.
pub const DEFAULT_INTER_CALL_DELAY: Duration = Duration::from_millis(200);

/// One matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Travel {
    Reachable { distance_m: f64, duration_s: f64 },
    Unreachable,
}

impl Travel {
    pub const ZERO: Travel = Travel::Reachable {
        distance_m: 0.0,
        duration_s: 0.0,
    };

    pub fn reachable(distance_m: f64, duration_s: f64) -> Self {
        Travel::Reachable {
            distance_m,
            duration_s,
        }
    }

    /// `(distance_m, duration_s)`, or `None` when unreachable.
    pub fn magnitudes(&self) -> Option<(f64, f64)> {
        match *self {
            Travel::Reachable {
                distance_m,
                duration_s,
            } => Some((distance_m, duration_s)),
            Travel::Unreachable => None,
        }
    }

    fn is_well_formed(&self) -> bool {
        self.magnitudes().is_none_or(|(distance, duration)| {
            distance.is_finite() && duration.is_finite() && distance >= 0.0 && duration >= 0.0
        })
    }
}

/// Square matrix of [`Travel`] cells, indexed `[origin][destination]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<Travel>,
}

impl DistanceMatrix {
    /// Build a matrix from explicit rows.
    ///
    /// Rows must be square with finite, non-negative magnitudes. The diagonal
    /// is forced to zero.
    pub fn from_rows(rows: Vec<Vec<Travel>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(MatrixError::InvalidCell {
                    row,
                    col: values.len().min(size),
                });
            }
            for (col, travel) in values.into_iter().enumerate() {
                if !travel.is_well_formed() {
                    return Err(MatrixError::InvalidCell { row, col });
                }
                cells.push(if row == col { Travel::ZERO } else { travel });
            }
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, from: usize, to: usize) -> Travel {
        self.cells[from * self.size + to]
    }
}

#[derive(Debug, Clone)]
pub struct DistanceMatrixBuilder<S> {
    service: S,
    batch_size: usize,
    inter_call_delay: Duration,
}

impl<S: DistanceService> DistanceMatrixBuilder<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_call_delay: DEFAULT_INTER_CALL_DELAY,
        }
    }

    /// Set the per-axis batch width. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn inter_call_delay(mut self, delay: Duration) -> Self {
        self.inter_call_delay = delay;
        self
    }

    /// Query the service for every batch pair and assemble the matrix.
    pub fn build(
        &self,
        locations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<DistanceMatrix, MatrixError> {
        let n = locations.len();
        if n < 2 {
            return Err(MatrixError::TooFewPoints(n));
        }

        let batches = batch_ranges(n, self.batch_size);
        let throttle = Throttle::new(self.inter_call_delay);
        let mut cells: Vec<Option<Travel>> = vec![None; n * n];

        for rows in &batches {
            for cols in &batches {
                tracing::debug!(
                    rows = ?rows,
                    cols = ?cols,
                    %mode,
                    "querying distance batch"
                );

                let grid = throttle
                    .run(|| {
                        self.service
                            .distances(&locations[rows.clone()], &locations[cols.clone()], mode)
                    })
                    .map_err(|source| MatrixError::Query {
                        rows: rows.clone(),
                        cols: cols.clone(),
                        source,
                    })?;

                check_shape(&grid, rows.len(), cols.len())?;

                for (r, row) in rows.clone().zip(grid) {
                    for (c, travel) in cols.clone().zip(row) {
                        if !travel.is_well_formed() {
                            return Err(MatrixError::InvalidCell { row: r, col: c });
                        }
                        cells[r * n + c] = Some(travel);
                    }
                }
            }
        }

        for i in 0..n {
            cells[i * n + i] = Some(Travel::ZERO);
        }

        let cells = cells
            .into_iter()
            .enumerate()
            .map(|(index, cell)| {
                cell.ok_or(MatrixError::InvalidCell {
                    row: index / n,
                    col: index % n,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DistanceMatrix { size: n, cells })
    }
}

/// Split `0..n` into consecutive ranges of at most `size` elements.
pub fn batch_ranges(n: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..n.div_ceil(size))
        .map(|batch| batch * size..((batch + 1) * size).min(n))
        .collect()
}

fn check_shape(grid: &[Vec<Travel>], rows: usize, cols: usize) -> Result<(), MatrixError> {
    let got_cols = grid.iter().map(Vec::len).find(|len| *len != cols);
    if grid.len() != rows || got_cols.is_some() {
        return Err(MatrixError::BatchShape {
            rows,
            cols,
            got_rows: grid.len(),
            got_cols: got_cols.unwrap_or(cols),
        });
    }
    Ok(())
}
