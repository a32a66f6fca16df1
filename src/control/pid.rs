//! PID heading controller
//!
//! Turns a desired heading into a (linear, angular) velocity command. Integration is
//! fixed-step with the configured `dt`; calling the controller at irregular intervals
//! skews the integral and derivative terms.

use serde::{Deserialize, Serialize};

use crate::common::{normalize_angle, ControlInput, Controller};

/// PID gains and accumulated terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidState {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub accumulated_error: f64,
    pub previous_error: f64,
}

impl PidState {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            accumulated_error: 0.0,
            previous_error: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.accumulated_error = 0.0;
        self.previous_error = 0.0;
    }

    /// Advance one step and return the PID output for `error`
    pub fn step(&mut self, error: f64, dt: f64) -> f64 {
        self.accumulated_error += error * dt;
        let derivative = (error - self.previous_error) / dt;
        self.previous_error = error;
        self.kp * error + self.ki * self.accumulated_error + self.kd * derivative
    }
}

/// Whether the integral and derivative history survives between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PidMode {
    #[default]
    Persistent,
    /// History cleared before every tick; the controller behaves as P + kd·e/dt
    ResetEachTick,
}

/// Heading controller settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingControlConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Fixed integration step [s]
    pub dt: f64,
    /// Heading error [rad] under which the robot counts as aligned
    pub tolerance: f64,
    /// Linear speed while turning towards the desired heading
    pub cruise_speed: f64,
    /// Linear speed once aligned
    pub aligned_speed: f64,
    pub mode: PidMode,
}

impl Default for HeadingControlConfig {
    fn default() -> Self {
        Self {
            kp: 0.02,
            ki: 0.0,
            kd: 0.01,
            dt: 0.05,
            tolerance: 0.1,
            cruise_speed: 0.2,
            aligned_speed: 0.8,
            mode: PidMode::Persistent,
        }
    }
}

/// PID loop from heading error to a velocity command
#[derive(Debug, Clone)]
pub struct HeadingController {
    config: HeadingControlConfig,
    pid: PidState,
}

impl HeadingController {
    pub fn new(config: HeadingControlConfig) -> Self {
        Self {
            pid: PidState::new(config.kp, config.ki, config.kd),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(HeadingControlConfig::default())
    }

    pub fn config(&self) -> &HeadingControlConfig {
        &self.config
    }

    pub fn pid(&self) -> &PidState {
        &self.pid
    }

    /// Command steering from `current` towards `desired` heading [rad]
    pub fn control(&mut self, current: f64, desired: f64) -> ControlInput {
        if self.config.mode == PidMode::ResetEachTick {
            self.pid.reset();
        }

        let error = normalize_angle(desired - current);
        if error.is_nan() {
            // keep the accumulated state clean
            log::warn!("Non-finite heading (current {}, desired {}), stopping", current, desired);
            return ControlInput::zero();
        }
        let omega = self.pid.step(error, self.config.dt);

        let v = if error.abs() < self.config.tolerance {
            self.config.aligned_speed
        } else {
            self.config.cruise_speed
        };

        ControlInput::new(v, omega)
    }
}

impl Controller for HeadingController {
    type State = f64;
    type Reference = f64;
    type Output = ControlInput;

    fn compute(&mut self, state: &Self::State, reference: &Self::Reference) -> Self::Output {
        self.control(*state, *reference)
    }

    fn reset(&mut self) {
        self.pid.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_pid_example() {
        let mut controller = HeadingController::with_defaults();
        let cmd = controller.control(0.0, FRAC_PI_2);

        let expected = 0.02 * FRAC_PI_2 + 0.01 * (FRAC_PI_2 / 0.05);
        assert_relative_eq!(cmd.omega, expected, epsilon = 1e-12);
        assert_relative_eq!(cmd.omega, 0.345575191894877, epsilon = 1e-12);
        assert_relative_eq!(cmd.v, 0.2);
        assert_relative_eq!(controller.pid().previous_error, FRAC_PI_2);
        assert_relative_eq!(controller.pid().accumulated_error, FRAC_PI_2 * 0.05);
    }

    #[test]
    fn test_aligned_speed() {
        let mut controller = HeadingController::with_defaults();
        let cmd = controller.control(1.0, 1.05);
        assert_relative_eq!(cmd.v, 0.8);
    }

    #[test]
    fn test_error_takes_short_way_round() {
        let mut controller = HeadingController::with_defaults();
        controller.control(3.0, -3.0);
        // -3 - 3 = -6 -> wrapped to 2π - 6
        assert_relative_eq!(controller.pid().previous_error, 2.0 * PI - 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_persistent_state_accumulates() {
        let config = HeadingControlConfig {
            kp: 0.0,
            ki: 1.0,
            kd: 0.0,
            ..HeadingControlConfig::default()
        };
        let mut controller = HeadingController::new(config);
        controller.control(0.0, 0.5);
        let second = controller.control(0.0, 0.5);
        assert_relative_eq!(second.omega, 2.0 * 0.5 * 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_each_tick_drops_history() {
        let config = HeadingControlConfig {
            kp: 0.0,
            ki: 1.0,
            kd: 0.01,
            mode: PidMode::ResetEachTick,
            ..HeadingControlConfig::default()
        };
        let mut controller = HeadingController::new(config);
        let first = controller.control(0.0, 0.5);
        let second = controller.control(0.0, 0.5);
        assert_relative_eq!(first.omega, second.omega, epsilon = 1e-12);
        assert_relative_eq!(second.omega, 0.5 * 0.05 + 0.01 * 0.5 / 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_huge_heading_still_wraps() {
        let mut controller = HeadingController::with_defaults();
        let cmd = controller.control(0.0, 1e17);
        assert!(cmd.omega.is_finite());
        assert!(controller.pid().previous_error.abs() <= PI);
    }

    #[test]
    fn test_non_finite_heading_stops_without_poisoning_state() {
        let mut controller = HeadingController::with_defaults();
        controller.control(0.0, 0.5);
        let before = *controller.pid();

        assert_eq!(controller.control(f64::INFINITY, 0.5), ControlInput::zero());
        assert_eq!(controller.control(0.0, f64::NAN), ControlInput::zero());
        assert_eq!(controller.pid().accumulated_error, before.accumulated_error);
        assert_eq!(controller.pid().previous_error, before.previous_error);
    }

    #[test]
    fn test_controller_trait_reset() {
        let mut controller = HeadingController::with_defaults();
        controller.compute(&0.0, &1.0);
        Controller::reset(&mut controller);
        assert_eq!(controller.pid().accumulated_error, 0.0);
        assert_eq!(controller.pid().previous_error, 0.0);
    }
}
