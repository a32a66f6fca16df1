//! Common traits defining interfaces for the mapping and control components

use crate::mapping::{OccupancyLayer, RobotFrame};

/// Occupancy update strategy.
///
/// Implementations update only the cells along, or inside the cone of, one sonar beam
/// and never write outside the grid.
pub trait OccupancyUpdater: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Certainty assigned to unobserved cells
    fn initial_value(&self) -> f64;

    /// Inclusive (min, max) certainty range
    fn value_range(&self) -> (f64, f64);

    /// Apply one beam reading. `beam_angle` is the sensor's mounting angle [rad];
    /// the beam points along `frame.pose.yaw - beam_angle`.
    fn update(&self, layer: &mut OccupancyLayer, frame: &RobotFrame, beam_angle: f64);
}

/// Trait for controllers (PID, LQR, MPC, etc.)
pub trait Controller {
    /// State type
    type State;
    /// Reference/target type
    type Reference;
    /// Output control type
    type Output;

    /// Compute control output
    fn compute(&mut self, state: &Self::State, reference: &Self::Reference) -> Self::Output;

    /// Reset controller state
    fn reset(&mut self);
}
