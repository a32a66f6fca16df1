//! Navigation potential field by seeded Jacobi relaxation
//!
//! Occupied, observed cells are pinned at potential 1.0. Around the robot every other
//! cell is repeatedly replaced by the mean of its four axis neighbours until the sum
//! of squared changes per sweep falls to `epsilon`. Cells outside the window keep
//! whatever value the last pass near them left behind.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::mapping::{CellAddress, OccupancyLayer};

/// Potential of a seeded obstacle cell
pub const SEED_POTENTIAL: f64 = 1.0;

/// Relaxation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Seed threshold as a fraction of the occupancy value range (10 of 15 for HIMM)
    pub seed_fraction: f64,
    /// Half-size of the relaxation window in cells
    pub radius: usize,
    /// Convergence bound on the per-sweep sum of squared changes
    pub epsilon: f64,
    /// Sweeps allowed before giving up
    pub max_iterations: usize,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            seed_fraction: 2.0 / 3.0,
            radius: 20,
            epsilon: 0.2,
            max_iterations: 10_000,
        }
    }
}

/// Inclusive cell window relaxed in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaxWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl RelaxWindow {
    /// Square window of `radius` around `center`, clamped to the interior `[1, n-2]`.
    /// `None` when the clamped window holds no cell.
    pub fn around(center: CellAddress, radius: usize, n: usize) -> Option<Self> {
        if n < 3 {
            return None;
        }
        let radius = radius as i64;
        let hi = n as i64 - 2;
        let clamp = |c: i32| {
            let c = c as i64;
            ((c - radius).max(1), (c + radius).min(hi))
        };
        let (row_start, row_end) = clamp(center.row);
        let (col_start, col_end) = clamp(center.col);
        if row_start > row_end || col_start > col_end {
            return None;
        }
        Some(Self {
            row_start: row_start as usize,
            row_end: row_end as usize,
            col_start: col_start as usize,
            col_end: col_end as usize,
        })
    }

    /// Whole interior of an `n`×`n` grid
    pub fn interior(n: usize) -> Option<Self> {
        (n >= 3).then(|| Self {
            row_start: 1,
            row_end: n - 2,
            col_start: 1,
            col_end: n - 2,
        })
    }
}

/// Outcome of one relaxation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationReport {
    pub iterations: usize,
    /// Sum of squared changes in the last sweep
    pub residual: f64,
    /// False when `max_iterations` ran out first
    pub converged: bool,
}

/// Pin every observed cell whose certainty exceeds `threshold` at `SEED_POTENTIAL`.
/// Other cells keep their value. Returns the number of seeded cells.
pub fn seed(field: &mut DMatrix<f64>, layer: &OccupancyLayer, threshold: f64) -> usize {
    let mut seeded = 0;
    for ((value, certainty), known) in field
        .iter_mut()
        .zip(layer.certainty.iter())
        .zip(layer.known.iter())
    {
        if *known && *certainty > threshold {
            *value = SEED_POTENTIAL;
            seeded += 1;
        }
    }
    seeded
}

/// Jacobi relaxation over `window`. Each sweep reads only the previous sweep's values.
pub fn relax(
    field: &mut DMatrix<f64>,
    window: RelaxWindow,
    epsilon: f64,
    max_iterations: usize,
) -> RelaxationReport {
    let mut next = field.clone();
    let mut report = RelaxationReport {
        iterations: 0,
        residual: 0.0,
        converged: false,
    };

    while report.iterations < max_iterations {
        let mut residual = 0.0;
        for row in window.row_start..=window.row_end {
            for col in window.col_start..=window.col_end {
                let current = field[(row, col)];
                if current >= SEED_POTENTIAL {
                    continue;
                }
                let relaxed = 0.25
                    * (field[(row - 1, col)]
                        + field[(row + 1, col)]
                        + field[(row, col - 1)]
                        + field[(row, col + 1)]);
                residual += (current - relaxed).powi(2);
                next[(row, col)] = relaxed;
            }
        }
        std::mem::swap(field, &mut next);

        report.iterations += 1;
        report.residual = residual;
        if residual <= epsilon {
            report.converged = true;
            break;
        }
    }

    report
}

/// Seeds and relaxes the navigation field around the robot
#[derive(Debug, Clone)]
pub struct PotentialFieldSolver {
    params: FieldParams,
    threshold: f64,
}

impl PotentialFieldSolver {
    /// `value_range` is the occupancy updater's (min, max) certainty range
    pub fn new(params: FieldParams, value_range: (f64, f64)) -> Self {
        let (min, max) = value_range;
        Self {
            params,
            threshold: min + params.seed_fraction * (max - min),
        }
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    /// Certainty above which an observed cell becomes an obstacle seed
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute a new field from the previous one. Only seeding happens when the robot
    /// cell is unknown or the window around it is empty.
    pub fn solve(
        &self,
        previous: &DMatrix<f64>,
        layer: &OccupancyLayer,
        robot: Option<CellAddress>,
    ) -> (DMatrix<f64>, Option<RelaxationReport>) {
        let mut field = previous.clone();
        let seeded = seed(&mut field, layer, self.threshold);

        let window = robot.and_then(|cell| RelaxWindow::around(cell, self.params.radius, field.nrows()));
        let report = window.map(|window| {
            relax(&mut field, window, self.params.epsilon, self.params.max_iterations)
        });

        match report {
            Some(r) if !r.converged => log::warn!(
                "Field relaxation did not converge in {} sweeps (residual {:.3e})",
                r.iterations,
                r.residual
            ),
            Some(r) => log::debug!(
                "Field relaxed: {} seeds, {} sweeps, residual {:.3e}",
                seeded,
                r.iterations,
                r.residual
            ),
            None => log::debug!("Field seeded ({} seeds), no relaxation window", seeded),
        }

        (field, report)
    }
}
