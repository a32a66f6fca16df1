//! Bayesian occupancy update with a conical sonar model
//!
//! Every cell inside the beam cone and not beyond the measured range is updated
//! with a recursive Bayes step. The sensor confidence falls off linearly with
//! distance from the sensor and with angle from the beam axis.

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use super::grid_spec::{CellAddress, GridSpec};
use super::occupancy_grid::{OccupancyLayer, RobotFrame};
use crate::common::{normalize_angle, OccupancyUpdater};

/// Bayesian sonar model constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesParams {
    /// Detection range R in grid world units
    pub max_range: f64,
    /// Half-width of the band around the measured range treated as the obstacle surface
    pub range_tolerance: f64,
    /// Upper bound on the sensor's confidence in a detection
    pub max_occupied: f64,
    /// Priors are clamped to `[prior_floor, 1 - prior_floor]`
    pub prior_floor: f64,
    pub initial_value: f64,
}

impl Default for BayesParams {
    fn default() -> Self {
        Self {
            max_range: 0.06,
            range_tolerance: 0.01,
            max_occupied: 0.98,
            prior_floor: 1e-3,
            initial_value: 0.5,
        }
    }
}

/// Bayesian occupancy updater
#[derive(Debug, Clone)]
pub struct BayesUpdater {
    spec: GridSpec,
    params: BayesParams,
}

impl BayesUpdater {
    pub fn new(spec: GridSpec, params: BayesParams) -> Self {
        Self { spec, params }
    }

    pub fn params(&self) -> &BayesParams {
        &self.params
    }

    /// Posterior occupancy of a cell at distance `r` and beam offset `alpha`
    /// given a reading `s` and the cell's prior
    pub fn posterior(&self, r: f64, alpha: f64, s: f64, beta: f64, prior: f64) -> f64 {
        let big_r = self.params.max_range;
        let floor = self.params.prior_floor;
        let prior = prior.clamp(floor, 1.0 - floor);

        let confidence =
            0.5 * ((big_r - r) / big_r + (beta - alpha.abs()) / beta) * self.params.max_occupied;

        let on_surface = (r - s).abs() <= self.params.range_tolerance && s <= big_r;
        if on_surface {
            let occupied = confidence * prior;
            occupied / (occupied + (1.0 - confidence) * (1.0 - prior))
        } else {
            let occupied = (1.0 - confidence) * prior;
            occupied / (occupied + confidence * (1.0 - prior))
        }
    }
}

impl OccupancyUpdater for BayesUpdater {
    fn name(&self) -> &'static str {
        "bayes"
    }

    fn initial_value(&self) -> f64 {
        self.params.initial_value
    }

    fn value_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn update(&self, layer: &mut OccupancyLayer, frame: &RobotFrame, beam_angle: f64) {
        let beta = frame.half_beamwidth;
        if !(beta > 0.0) || !(self.params.max_range > 0.0) {
            return;
        }

        let s = if frame.range.is_nan() { f64::INFINITY } else { frame.range };
        let global_angle = frame.pose.yaw - beam_angle;
        if !global_angle.is_finite() {
            return;
        }
        let n = layer.size() as i32;

        for (row, col) in iproduct!(0..n, 0..n) {
            let cell = CellAddress::new(row, col);
            if cell == frame.cell {
                continue;
            }

            let center = self.spec.to_center(cell);
            let dx = center.x - frame.center.x;
            let dy = center.y - frame.center.y;
            let r = dx.hypot(dy);
            let alpha = normalize_angle(dy.atan2(dx) - global_angle);

            let in_cone = r <= self.params.max_range
                && r <= s + self.params.range_tolerance
                && alpha.abs() <= beta;
            if !in_cone {
                continue;
            }

            let idx = cell.index();
            layer.certainty[idx] = self.posterior(r, alpha, s, beta, layer.certainty[idx]);
            layer.known[idx] = true;
        }
    }
}
