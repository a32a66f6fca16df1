//! Runtime configuration
//!
//! Every section has defaults matching the sonar robot the constants were tuned on,
//! so a config file only needs the values it changes:
//!
//! ```toml
//! [grid]
//! origin = -1.0
//! extent = 1.0
//! step = 0.005
//!
//! [mapping]
//! algorithm = "bayes"
//!
//! [control.heading]
//! mode = "reset_each_tick"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Pose2D};
use crate::control::{HeadingControlConfig, WheelLimits};
use crate::mapping::{BayesParams, GridSpec, HimmParams, UpdateAlgorithm};
use crate::path_planning::FieldParams;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub grid: GridSpec,
    pub frame: FrameConfig,
    pub sensors: SensorConfig,
    pub mapping: MappingConfig,
    pub field: FieldConfig,
    pub control: ControlConfig,
}

/// Mapping from simulator units into grid world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub scale_factor: f64,
    /// Subtracted after scaling, (x, y)
    pub offset: [f64; 2],
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            scale_factor: 0.03,
            offset: [0.0, 0.0],
        }
    }
}

impl FrameConfig {
    pub fn to_grid_pose(&self, pose: &Pose2D) -> Pose2D {
        Pose2D::new(
            pose.x * self.scale_factor - self.offset[0],
            pose.y * self.scale_factor - self.offset[1],
            pose.yaw,
        )
    }

    pub fn to_grid_range(&self, range: f64) -> f64 {
        range * self.scale_factor
    }
}

/// Sonar ring layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Mounting angle of every sonar, by index [deg]
    pub angles_deg: Vec<f64>,
    /// Sonar indices fed into the map
    pub active: Vec<usize>,
    /// Half beamwidth used by the Bayesian model [deg]
    pub half_beamwidth_deg: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            angles_deg: vec![
                -90.0, -50.0, -30.0, -10.0, 10.0, 30.0, 50.0, 90.0, 90.0, 130.0, 150.0, 170.0,
                -170.0, -150.0, -130.0, -90.0,
            ],
            active: vec![0, 1, 2, 3, 4, 5, 6, 7, 9, 10, 11, 12, 13, 14],
            half_beamwidth_deg: 15.0,
        }
    }
}

impl SensorConfig {
    /// (sonar index, mounting angle [rad]) for every active sonar
    pub fn beams(&self) -> Vec<(usize, f64)> {
        self.active
            .iter()
            .filter_map(|&i| self.angles_deg.get(i).map(|a| (i, a.to_radians())))
            .collect()
    }

    pub fn half_beamwidth(&self) -> f64 {
        self.half_beamwidth_deg.to_radians()
    }
}

/// Occupancy update selection and constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub algorithm: UpdateAlgorithm,
    /// How long the mapping thread waits for a sample before rechecking shutdown [ms]
    pub poll_interval_ms: u64,
    pub himm: HimmParams,
    pub bayes: BayesParams,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            algorithm: UpdateAlgorithm::Himm,
            poll_interval_ms: 100,
            himm: HimmParams::default(),
            bayes: BayesParams::default(),
        }
    }
}

/// Field solver schedule and parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub period_ms: u64,
    pub solver: FieldParams,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            period_ms: 200,
            solver: FieldParams::default(),
        }
    }
}

/// Control loop schedule and parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub period_ms: u64,
    pub heading: HeadingControlConfig,
    pub wheels: WheelLimits,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period_ms: 50,
            heading: HeadingControlConfig::default(),
            wheels: WheelLimits::default(),
        }
    }
}

fn invalid(message: impl Into<String>) -> NavError {
    NavError::InvalidParameter(message.into())
}

impl NavConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> NavResult<Self> {
        let config: NavConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> NavResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> NavResult<()> {
        self.grid.validate()?;

        if !(self.frame.scale_factor > 0.0 && self.frame.scale_factor.is_finite()) {
            return Err(invalid("frame.scale_factor must be positive and finite"));
        }
        if !self.frame.offset.iter().all(|v| v.is_finite()) {
            return Err(invalid("frame.offset must be finite"));
        }

        let sonar_count = self.sensors.angles_deg.len();
        if let Some(bad) = self.sensors.active.iter().find(|&&i| i >= sonar_count) {
            return Err(invalid(format!(
                "sensors.active index {} out of range for {} sonars",
                bad, sonar_count
            )));
        }
        if self.mapping.algorithm == UpdateAlgorithm::Bayes && !(self.sensors.half_beamwidth_deg > 0.0) {
            return Err(invalid("sensors.half_beamwidth_deg must be positive for the bayes model"));
        }

        if self.mapping.poll_interval_ms == 0 {
            return Err(invalid("mapping.poll_interval_ms must be non-zero"));
        }

        let himm = &self.mapping.himm;
        if !(himm.min_value < himm.max_value) || !(himm.max_range > 0.0) {
            return Err(invalid("mapping.himm needs min_value < max_value and max_range > 0"));
        }
        if !(himm.increment >= 0.0) || !(himm.decrement >= 0.0) {
            return Err(invalid("mapping.himm increment and decrement must be >= 0"));
        }
        if !(himm.min_value..=himm.max_value).contains(&himm.initial_value) {
            return Err(invalid(format!(
                "mapping.himm.initial_value {} outside [{}, {}]",
                himm.initial_value, himm.min_value, himm.max_value
            )));
        }

        let bayes = &self.mapping.bayes;
        if !(bayes.max_range > 0.0) || !(bayes.range_tolerance >= 0.0) {
            return Err(invalid("mapping.bayes needs max_range > 0 and range_tolerance >= 0"));
        }
        if !(bayes.max_occupied > 0.0 && bayes.max_occupied < 1.0) {
            return Err(invalid("mapping.bayes.max_occupied must lie in (0, 1)"));
        }
        if !(bayes.prior_floor > 0.0 && bayes.prior_floor < 0.5) {
            return Err(invalid("mapping.bayes.prior_floor must lie in (0, 0.5)"));
        }
        if !(0.0..=1.0).contains(&bayes.initial_value) {
            return Err(invalid("mapping.bayes.initial_value must lie in [0, 1]"));
        }

        let solver = &self.field.solver;
        if !(solver.epsilon >= 0.0) || solver.max_iterations == 0 {
            return Err(invalid("field.solver needs epsilon >= 0 and max_iterations > 0"));
        }
        if !(0.0..=1.0).contains(&solver.seed_fraction) {
            return Err(invalid("field.solver.seed_fraction must lie in [0, 1]"));
        }

        if !(self.control.heading.dt > 0.0) {
            return Err(invalid("control.heading.dt must be positive"));
        }
        if !(self.control.wheels.axle_width > 0.0) || !(self.control.wheels.max_wheel_speed > 0.0) {
            return Err(invalid("control.wheels limits must be positive"));
        }
        if self.field.period_ms == 0 || self.control.period_ms == 0 {
            return Err(invalid("task periods must be non-zero"));
        }

        Ok(())
    }
}
