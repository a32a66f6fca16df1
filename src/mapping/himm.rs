//! Histogramic in-motion mapping (HIMM)
//!
//! Cells the beam passes through lose a fixed amount of certainty. The cell the
//! beam ends in is raised to a weighted sum over its 3×3 neighbourhood when the
//! sonar actually detected something, and lowered like a free cell otherwise.

use serde::{Deserialize, Serialize};

use super::grid_spec::GridSpec;
use super::occupancy_grid::{OccupancyLayer, RobotFrame};
use super::ray_tracer::trace;
use crate::common::OccupancyUpdater;

/// Neighbourhood weights, centre first in importance
const IMPORTANCE: [[f64; 3]; 3] = [[0.5, 0.5, 0.5], [0.5, 1.0, 0.5], [0.5, 0.5, 0.5]];

/// HIMM constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HimmParams {
    /// Sensor range clamp in grid world units; longer readings count as "no detection"
    pub max_range: f64,
    /// Value substituted for the detected cell in the neighbourhood sum
    pub increment: f64,
    /// Certainty removed from free cells
    pub decrement: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub initial_value: f64,
}

impl Default for HimmParams {
    fn default() -> Self {
        Self {
            max_range: 0.06,
            increment: 3.0,
            decrement: 1.0,
            min_value: 0.0,
            max_value: 15.0,
            initial_value: 7.5,
        }
    }
}

/// HIMM occupancy updater
#[derive(Debug, Clone)]
pub struct HimmUpdater {
    spec: GridSpec,
    params: HimmParams,
}

impl HimmUpdater {
    pub fn new(spec: GridSpec, params: HimmParams) -> Self {
        Self { spec, params }
    }

    pub fn params(&self) -> &HimmParams {
        &self.params
    }

    /// Weighted 3×3 sum around `occupied`, read before this reading changes anything
    fn neighbourhood_value(&self, layer: &OccupancyLayer, occupied: super::CellAddress) -> f64 {
        let mut sum = 0.0;
        for (i, weights) in IMPORTANCE.iter().enumerate() {
            for (j, weight) in weights.iter().enumerate() {
                let cell = occupied.offset(i as i32 - 1, j as i32 - 1);
                if cell == occupied {
                    sum += self.params.increment * weight;
                } else if let Some(value) = layer.get(cell) {
                    sum += value * weight;
                }
            }
        }
        sum.min(self.params.max_value)
    }

    fn lower(&self, layer: &mut OccupancyLayer, cell: super::CellAddress) {
        let value = &mut layer.certainty[cell.index()];
        *value = (*value - self.params.decrement).max(self.params.min_value);
    }
}

impl OccupancyUpdater for HimmUpdater {
    fn name(&self) -> &'static str {
        "himm"
    }

    fn initial_value(&self) -> f64 {
        self.params.initial_value
    }

    fn value_range(&self) -> (f64, f64) {
        (self.params.min_value, self.params.max_value)
    }

    fn update(&self, layer: &mut OccupancyLayer, frame: &RobotFrame, beam_angle: f64) {
        let global_angle = frame.pose.yaw - beam_angle;

        let range = if frame.range.is_finite() {
            frame.range.max(0.0)
        } else {
            f64::INFINITY
        };
        let detected = range <= self.params.max_range;
        let distance = range.min(self.params.max_range);

        let end_x = frame.center.x + global_angle.cos() * distance;
        let end_y = frame.center.y + global_angle.sin() * distance;
        let Some(end_cell) = self.spec.locate(end_x, end_y) else {
            return;
        };
        if !layer.contains(end_cell) || !layer.contains(frame.cell) {
            return;
        }

        let path = trace(frame.cell, end_cell);
        let Some((&occupied, free)) = path.split_last() else {
            return;
        };

        let occupied_value = detected.then(|| self.neighbourhood_value(layer, occupied));

        for &cell in free {
            if layer.contains(cell) {
                self.lower(layer, cell);
                layer.mark_known(cell);
            }
        }

        match occupied_value {
            Some(value) => layer.certainty[occupied.index()] = value,
            None => self.lower(layer, occupied),
        }
        layer.mark_known(occupied);
    }
}
