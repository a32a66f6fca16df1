//! Utility modules for field_nav

pub mod sonar_sim;
pub mod visualization;

pub use sonar_sim::{Room, Segment, SonarSimulator};
pub use visualization::{colors, grid_heatmap, normalize_for_display, Visualizer};
