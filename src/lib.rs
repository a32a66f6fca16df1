//! field_nav - sonar occupancy mapping and potential-field navigation
//!
//! A robot with a ring of sonars builds an occupancy grid (HIMM or Bayesian updates
//! along Bresenham rays), relaxes a harmonic potential field around itself with
//! obstacles as fixed sources, and steers down the field gradient with a PID heading
//! controller. Mapping, field solving and control run as three threads over a shared,
//! lock-disciplined grid store.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod path_tracking;
pub mod control;

// Runtime
pub mod store;
pub mod threads;

// Re-export common types for convenience
pub use common::{ControlInput, Point2D, Pose2D, SensorSample};
pub use common::{Controller, OccupancyUpdater};
pub use common::{NavError, NavResult};
pub use config::NavConfig;
pub use store::GridStore;
pub use threads::NavigationRuntime;
