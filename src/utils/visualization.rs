//! Visualization utilities for field_nav
//!
//! Grid heatmaps and robot overlays rendered through gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};
use nalgebra::DMatrix;

use crate::common::{NavError, NavResult, Pose2D};
use crate::mapping::GridSpec;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const CYAN: &str = "#00FFFF";
    pub const WHITE: &str = "#FFFFFF";

    // Semantic colors
    pub const ROBOT: &str = CYAN;
    pub const TRAJECTORY: &str = WHITE;
    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = GREEN;
    pub const HEADING: &str = RED;
}

/// Scale a grid so its largest value maps to 1.0. All-zero grids are returned as is.
pub fn normalize_for_display(grid: &DMatrix<f64>) -> DMatrix<f64> {
    let max = grid.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 && max.is_finite() {
        grid / max
    } else {
        grid.clone()
    }
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "X".to_string(),
            y_label: "Y".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Fix both axes to the extent of `spec`
    pub fn fit_grid(&mut self, spec: &GridSpec) -> &mut Self {
        self.x_range = Some((spec.origin, spec.extent));
        self.y_range = Some((spec.origin, spec.extent));
        self
    }

    /// Heatmap of a square grid laid over the world extent of `spec`.
    /// Row `i` is drawn at y of row `i`, so the image matches world orientation.
    pub fn plot_grid(&mut self, grid: &DMatrix<f64>, spec: &GridSpec, caption: &str) -> &mut Self {
        let (rows, cols) = grid.shape();
        let x_max = spec.origin + cols as f64 * spec.step;
        let y_max = spec.origin + rows as f64 * spec.step;

        // gnuplot expects row-major data
        let row_major = grid.transpose();

        self.figure.axes2d().image(
            row_major.iter().cloned(),
            rows,
            cols,
            Some((spec.origin, spec.origin, x_max, y_max)),
            &[Caption(caption)],
        );
        self
    }

    /// Plot robot pose with direction indicator
    pub fn plot_robot(&mut self, pose: &Pose2D, size: f64) -> &mut Self {
        self.figure.axes2d().points(
            &[pose.x],
            &[pose.y],
            &[Caption("Robot"), Color(colors::ROBOT), PointSymbol('O'), PointSize(size)],
        );

        let arrow_len = size * 0.05;
        let end_x = pose.x + arrow_len * pose.yaw.cos();
        let end_y = pose.y + arrow_len * pose.yaw.sin();

        self.figure.axes2d().lines(
            &[pose.x, end_x],
            &[pose.y, end_y],
            &[Color(colors::HEADING), LineWidth(2.0)],
        );
        self
    }

    /// Plot the path the robot drove
    pub fn plot_trajectory(&mut self, poses: &[Pose2D]) -> &mut Self {
        let x: Vec<f64> = poses.iter().map(|p| p.x).collect();
        let y: Vec<f64> = poses.iter().map(|p| p.y).collect();

        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption("Trajectory"), Color(colors::TRAJECTORY), LineWidth(1.5)],
        );
        self
    }

    /// Save plot to SVG file
    pub fn save_svg(&mut self, path: &str, width: u32, height: u32) -> NavResult<()> {
        self.apply_settings();
        self.figure
            .save_to_svg(path, width, height)
            .map_err(|e| NavError::VisualizationError(e.to_string()))?;
        log::info!("Plot saved to {}", path);
        Ok(())
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Heatmap of `grid` with an optional robot trajectory, scaled to [0, 1]
pub fn grid_heatmap(grid: &DMatrix<f64>, spec: &GridSpec, title: &str, trajectory: &[Pose2D]) -> Visualizer {
    let mut vis = Visualizer::new();
    vis.set_title(title).fit_grid(spec);
    vis.plot_grid(&normalize_for_display(grid), spec, title);

    if !trajectory.is_empty() {
        vis.plot_trajectory(trajectory);
    }
    if let Some(last) = trajectory.last() {
        vis.plot_robot(last, 1.5);
    }

    vis
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_visualizer_creation() {
        let vis = Visualizer::new();
        assert!(vis.aspect_ratio.is_some());
    }

    #[test]
    fn test_fit_grid_sets_ranges() {
        let mut vis = Visualizer::new();
        vis.fit_grid(&GridSpec::default());
        assert_eq!(vis.x_range, Some((-1.0, 1.0)));
        assert_eq!(vis.y_range, Some((-1.0, 1.0)));
    }

    #[test]
    fn test_grid_heatmap_fits_spec() {
        let spec = GridSpec::new(0.0, 1.0, 0.1).unwrap();
        let vis = grid_heatmap(&DMatrix::zeros(10, 10), &spec, "field", &[Pose2D::origin()]);
        assert_eq!(vis.title, "field");
        assert_eq!(vis.x_range, Some((0.0, 1.0)));
        assert_eq!(vis.y_range, Some((0.0, 1.0)));
    }

    #[test]
    fn test_normalize_scales_by_max() {
        let grid = DMatrix::from_row_slice(2, 2, &[0.0, 7.5, 15.0, 3.0]);
        let scaled = normalize_for_display(&grid);
        assert_relative_eq!(scaled[(1, 0)], 1.0);
        assert_relative_eq!(scaled[(0, 1)], 0.5);
        assert_relative_eq!(scaled[(1, 1)], 0.2);
    }

    #[test]
    fn test_normalize_all_zero() {
        let grid = DMatrix::<f64>::zeros(3, 3);
        assert_eq!(normalize_for_display(&grid), grid);
    }
}
