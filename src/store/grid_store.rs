//! Shared grid state for the mapping, field and control tasks
//!
//! Three independent locks: occupancy (certainty + known mask), navigation field and
//! the latest robot pose. No method holds more than one of them at a time. The field
//! is published as a whole new `Arc` so readers never see a half-relaxed matrix.

use std::path::Path;
use std::sync::Arc;

use itertools::iproduct;
use nalgebra::DMatrix;
use parking_lot::RwLock;

use crate::common::{NavError, NavResult, OccupancyUpdater, Pose2D, SensorSample};
use crate::config::{FrameConfig, NavConfig, SensorConfig};
use crate::mapping::{load_grid, save_grid, CellAddress, GridSpec, OccupancyLayer, RobotFrame};
use crate::path_planning::{FieldParams, PotentialFieldSolver, RelaxationReport};

/// Owner of the occupancy grid, known-region mask and navigation field
pub struct GridStore {
    spec: GridSpec,
    updater: Box<dyn OccupancyUpdater>,
    occupancy: RwLock<OccupancyLayer>,
    field: RwLock<Arc<DMatrix<f64>>>,
    pose: RwLock<Option<Pose2D>>,
}

impl GridStore {
    /// Empty store: every cell unknown at the updater's initial certainty, field at zero
    pub fn new(spec: GridSpec, updater: Box<dyn OccupancyUpdater>) -> NavResult<Self> {
        spec.validate()?;
        let n = spec.size();
        log::info!(
            "Grid store: {}x{} cells of {} over [{}, {}), {} updates",
            n,
            n,
            spec.step,
            spec.origin,
            spec.extent,
            updater.name()
        );

        Ok(Self {
            spec,
            occupancy: RwLock::new(OccupancyLayer::new(n, updater.initial_value())),
            field: RwLock::new(Arc::new(DMatrix::zeros(n, n))),
            pose: RwLock::new(None),
            updater,
        })
    }

    pub fn from_config(config: &NavConfig) -> NavResult<Self> {
        let mapping = &config.mapping;
        let updater = mapping.algorithm.build(config.grid, mapping.himm, mapping.bayes);
        Self::new(config.grid, updater)
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn updater(&self) -> &dyn OccupancyUpdater {
        self.updater.as_ref()
    }

    /// Field solver matched to this store's certainty range
    pub fn field_solver(&self, params: FieldParams) -> PotentialFieldSolver {
        PotentialFieldSolver::new(params, self.updater.value_range())
    }

    /// Run `f` under the occupancy write lock
    pub fn update_occupancy<R>(&self, f: impl FnOnce(&mut OccupancyLayer) -> R) -> R {
        let mut layer = self.occupancy.write();
        f(&mut layer)
    }

    /// Apply every active beam of one sample under a single write lock and record the
    /// robot pose. Returns the number of beams applied; zero when the robot is off-grid.
    /// A pose with a non-finite component is dropped without being recorded.
    pub fn apply_sample(&self, sample: &SensorSample, frame: &FrameConfig, sensors: &SensorConfig) -> usize {
        let pose = frame.to_grid_pose(&sample.pose);
        if !(pose.x.is_finite() && pose.y.is_finite() && pose.yaw.is_finite()) {
            log::warn!("Non-finite pose ({}, {}, {}), sample dropped", pose.x, pose.y, pose.yaw);
            return 0;
        }

        let applied = match RobotFrame::new(&self.spec, pose, 0.0, sensors.half_beamwidth()) {
            Some(robot) => {
                let beams: Vec<(RobotFrame, f64)> = sensors
                    .beams()
                    .into_iter()
                    .filter_map(|(index, angle)| {
                        let range = *sample.ranges.get(index)?;
                        Some((robot.with_range(frame.to_grid_range(range)), angle))
                    })
                    .collect();

                self.update_occupancy(|layer| {
                    for (beam_frame, angle) in &beams {
                        self.updater.update(layer, beam_frame, *angle);
                    }
                });
                beams.len()
            }
            None => {
                log::warn!("Robot at ({:.3}, {:.3}) is outside the grid, sample skipped", pose.x, pose.y);
                0
            }
        };

        self.set_pose(pose);
        applied
    }

    /// Copy of the certainty grid and known mask
    pub fn occupancy_snapshot(&self) -> OccupancyLayer {
        self.occupancy.read().clone()
    }

    /// Current navigation field; stays valid after later publishes
    pub fn field_snapshot(&self) -> Arc<DMatrix<f64>> {
        Arc::clone(&self.field.read())
    }

    /// Replace the navigation field
    pub fn publish_field(&self, field: DMatrix<f64>) -> NavResult<()> {
        let n = self.spec.size();
        if field.shape() != (n, n) {
            return Err(NavError::ShapeMismatch {
                expected_rows: n,
                expected_cols: n,
                rows: field.nrows(),
                cols: field.ncols(),
            });
        }
        *self.field.write() = Arc::new(field);
        Ok(())
    }

    /// Recompute the field from an occupancy snapshot and publish it
    pub fn solve_field(&self, solver: &PotentialFieldSolver) -> Option<RelaxationReport> {
        let layer = self.occupancy_snapshot();
        let previous = self.field_snapshot();
        let robot = self.robot_cell();

        let (field, report) = solver.solve(&previous, &layer, robot);
        *self.field.write() = Arc::new(field);
        report
    }

    /// Latest robot pose in grid world units
    pub fn pose(&self) -> Option<Pose2D> {
        *self.pose.read()
    }

    pub fn set_pose(&self, pose: Pose2D) {
        *self.pose.write() = Some(pose);
    }

    /// Cell under the latest pose, if the robot is on the grid
    pub fn robot_cell(&self) -> Option<CellAddress> {
        let pose = self.pose()?;
        self.spec.locate(pose.x, pose.y)
    }

    /// Write the certainty grid to `path`
    pub fn save_occupancy<P: AsRef<Path>>(&self, path: P) -> NavResult<()> {
        let certainty = self.occupancy.read().certainty.clone();
        save_grid(&certainty, path)
    }

    /// Replace the certainty grid with the one stored at `path`.
    ///
    /// Every value must lie within the updater's certainty range. Cells whose loaded
    /// value differs from the initial certainty are marked known. On any error the
    /// store is left untouched.
    pub fn load_occupancy<P: AsRef<Path>>(&self, path: P) -> NavResult<()> {
        let grid = load_grid(path)?;
        let n = self.spec.size();
        if grid.shape() != (n, n) {
            return Err(NavError::ShapeMismatch {
                expected_rows: n,
                expected_cols: n,
                rows: grid.nrows(),
                cols: grid.ncols(),
            });
        }

        let (min, max) = self.updater.value_range();
        for (row, col) in iproduct!(0..n, 0..n) {
            let value = grid[(row, col)];
            if !(min..=max).contains(&value) {
                return Err(NavError::InvalidParameter(format!(
                    "loaded certainty {} at row {}, column {} is outside [{}, {}]",
                    value, row, col, min, max
                )));
            }
        }

        let initial = self.updater.initial_value();
        self.update_occupancy(|layer| {
            for (known, value) in layer.known.iter_mut().zip(grid.iter()) {
                if *value != initial {
                    *known = true;
                }
            }
            layer.certainty = grid;
        });
        Ok(())
    }
}
