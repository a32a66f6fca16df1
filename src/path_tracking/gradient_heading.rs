//! Steering direction from the local gradient of the navigation field
//!
//! The robot descends the field: the desired heading points away from the
//! high-potential obstacle cells around it.

use nalgebra::DMatrix;

use crate::mapping::GridSpec;

/// Central-difference gradient at a cell and the descent heading it implies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGradient {
    pub dx: f64,
    pub dy: f64,
    /// Desired heading [rad], `atan2(-dy, -dx)`
    pub heading: f64,
}

/// Gradient of `field` at the cell containing world position (x, y).
///
/// Returns `None` when the cell has no four in-bounds neighbours, i.e. within one
/// cell of the grid edge or outside the grid. Callers treat that as "no new command".
pub fn field_gradient(field: &DMatrix<f64>, spec: &GridSpec, x: f64, y: f64) -> Option<FieldGradient> {
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let cell = spec.to_cell(x, y);
    let width = field.ncols() as i64;
    let height = field.nrows() as i64;
    let (col, row) = (cell.col as i64, cell.row as i64);

    if col <= 0 || col >= width - 1 || row <= 0 || row >= height - 1 {
        return None;
    }

    let (row, col) = (row as usize, col as usize);
    let dx = field[(row, col + 1)] - field[(row, col - 1)];
    let dy = field[(row + 1, col)] - field[(row - 1, col)];

    Some(FieldGradient {
        dx,
        dy,
        heading: (-dy).atan2(-dx),
    })
}

/// Desired heading at (x, y), or `None` near the boundary
pub fn desired_heading(field: &DMatrix<f64>, spec: &GridSpec, x: f64, y: f64) -> Option<f64> {
    field_gradient(field, spec, x, y).map(|g| g.heading)
}
