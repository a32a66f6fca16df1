//! Differential-drive wheel speed saturation

use serde::{Deserialize, Serialize};

use crate::common::ControlInput;

/// Wheel geometry and speed limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelLimits {
    /// Distance between the wheels [m]
    pub axle_width: f64,
    /// Largest speed either wheel may reach [m/s]
    pub max_wheel_speed: f64,
}

impl Default for WheelLimits {
    fn default() -> Self {
        Self {
            axle_width: 0.38,
            max_wheel_speed: 0.5,
        }
    }
}

impl WheelLimits {
    /// (left, right) wheel speeds for a command
    pub fn wheel_speeds(&self, cmd: ControlInput) -> (f64, f64) {
        let half_turn = cmd.omega * self.axle_width / 2.0;
        (cmd.v - half_turn, cmd.v + half_turn)
    }

    /// Scale both wheels down together so the faster one stays within the limit.
    /// Keeps the turning radius of the requested command.
    pub fn saturate(&self, cmd: ControlInput) -> ControlInput {
        let (mut left, mut right) = self.wheel_speeds(cmd);
        let fastest = left.abs().max(right.abs());

        if fastest > self.max_wheel_speed {
            let scale = self.max_wheel_speed / fastest;
            left *= scale;
            right *= scale;
        }

        ControlInput::new((left + right) / 2.0, (right - left) / self.axle_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_within_limits_unchanged() {
        let limits = WheelLimits::default();
        let cmd = ControlInput::new(0.2, 0.5);
        let out = limits.saturate(cmd);
        assert_relative_eq!(out.v, 0.2, epsilon = 1e-12);
        assert_relative_eq!(out.omega, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_fast_forward_scaled() {
        let limits = WheelLimits::default();
        let out = limits.saturate(ControlInput::new(0.8, 0.0));
        assert_relative_eq!(out.v, 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.omega, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_turn_ratio_preserved() {
        let limits = WheelLimits::default();
        let cmd = ControlInput::new(0.8, 2.0);
        let out = limits.saturate(cmd);

        let (left, right) = limits.wheel_speeds(out);
        assert_relative_eq!(left.abs().max(right.abs()), 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.omega / out.v, cmd.omega / cmd.v, epsilon = 1e-9);
    }
}
