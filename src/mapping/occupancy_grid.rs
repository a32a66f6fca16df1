//! Occupancy certainty grid, known-region mask and the per-reading robot frame

use nalgebra::DMatrix;

use super::grid_spec::{in_bounds, CellAddress, GridSpec};
use crate::common::{Point2D, Pose2D};

/// Occupancy certainty and the cells any sensor update has touched.
///
/// Both matrices are indexed `(row, col)` and always share the same square shape.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyLayer {
    pub certainty: DMatrix<f64>,
    pub known: DMatrix<bool>,
}

impl OccupancyLayer {
    /// Grid of `n`×`n` cells, every cell at `initial` certainty and unknown
    pub fn new(n: usize, initial: f64) -> Self {
        Self {
            certainty: DMatrix::from_element(n, n, initial),
            known: DMatrix::from_element(n, n, false),
        }
    }

    pub fn size(&self) -> usize {
        self.certainty.nrows()
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        in_bounds(addr, self.size())
    }

    pub fn get(&self, addr: CellAddress) -> Option<f64> {
        self.contains(addr).then(|| self.certainty[addr.index()])
    }

    pub fn is_known(&self, addr: CellAddress) -> bool {
        self.contains(addr) && self.known[addr.index()]
    }

    /// Mark a cell observed. The mask never goes back to false.
    pub fn mark_known(&mut self, addr: CellAddress) {
        if self.contains(addr) {
            self.known[addr.index()] = true;
        }
    }

    pub fn known_count(&self) -> usize {
        self.known.iter().filter(|k| **k).count()
    }
}

/// Robot state captured for a single range reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotFrame {
    /// Pose in grid world units
    pub pose: Pose2D,
    /// Cell the robot occupies
    pub cell: CellAddress,
    /// Center of `cell`; beams originate here
    pub center: Point2D,
    /// Measured range in grid world units
    pub range: f64,
    /// Sensor half beamwidth [rad]
    pub half_beamwidth: f64,
}

impl RobotFrame {
    /// Frame for a pose, or `None` when the robot lies outside the grid or any pose
    /// component is not finite
    pub fn new(spec: &GridSpec, pose: Pose2D, range: f64, half_beamwidth: f64) -> Option<Self> {
        if !pose.yaw.is_finite() {
            return None;
        }
        let cell = spec.locate(pose.x, pose.y)?;
        Some(Self {
            pose,
            cell,
            center: spec.to_center(cell),
            range,
            half_beamwidth,
        })
    }

    /// Same frame with a different measured range
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }
}
