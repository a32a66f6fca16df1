//! Grid geometry and world/cell coordinate conversion
//!
//! Rows index the y axis and columns index the x axis. Every module in the crate
//! uses that convention, including cell centers.

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Point2D};

/// Integer cell address in a square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: i32,
    pub col: i32,
}

impl CellAddress {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// (row, col) as matrix indices. Only meaningful for in-bounds addresses.
    pub fn index(&self) -> (usize, usize) {
        (self.row as usize, self.col as usize)
    }

    pub fn offset(&self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }
}

/// Square grid covering `[origin, extent)` on both axes with cells of size `step`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub origin: f64,
    pub extent: f64,
    pub step: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            origin: -1.0,
            extent: 1.0,
            step: 0.005,
        }
    }
}

impl GridSpec {
    /// Create a validated grid spec
    pub fn new(origin: f64, extent: f64, step: f64) -> NavResult<Self> {
        let spec = Self { origin, extent, step };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> NavResult<()> {
        if !(self.step > 0.0) || !self.step.is_finite() {
            return Err(NavError::InvalidParameter(format!(
                "grid step must be positive, got {}",
                self.step
            )));
        }
        if !(self.extent > self.origin) {
            return Err(NavError::InvalidParameter(format!(
                "grid extent {} must exceed origin {}",
                self.extent, self.origin
            )));
        }
        if self.size() == 0 {
            return Err(NavError::InvalidParameter(
                "grid must contain at least one cell".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of cells per side
    pub fn size(&self) -> usize {
        ((self.extent - self.origin) / self.step).floor() as usize
    }

    /// Cell containing the world position. Positions on a boundary map to the lower cell.
    pub fn to_cell(&self, x: f64, y: f64) -> CellAddress {
        let col = ((x - self.origin) / self.step).floor() as i32;
        let row = ((y - self.origin) / self.step).floor() as i32;
        CellAddress::new(row, col)
    }

    /// In-grid cell containing the world position; `None` for positions off the grid
    /// or with a non-finite coordinate
    pub fn locate(&self, x: f64, y: f64) -> Option<CellAddress> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let cell = self.to_cell(x, y);
        self.contains(cell).then_some(cell)
    }

    /// World position of a cell's midpoint
    pub fn to_center(&self, addr: CellAddress) -> Point2D {
        let half = self.step / 2.0;
        Point2D::new(
            self.origin + addr.col as f64 * self.step + half,
            self.origin + addr.row as f64 * self.step + half,
        )
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        in_bounds(addr, self.size())
    }
}

/// True when `addr` lies inside an `n`×`n` grid
pub fn in_bounds(addr: CellAddress, n: usize) -> bool {
    let n = n as i64;
    (0..n).contains(&(addr.row as i64)) && (0..n).contains(&(addr.col as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_spec_size() {
        assert_eq!(GridSpec::default().size(), 400);
    }

    #[test]
    fn test_invalid_specs_rejected() {
        assert!(GridSpec::new(1.0, -1.0, 0.1).is_err());
        assert!(GridSpec::new(-1.0, 1.0, 0.0).is_err());
        assert!(GridSpec::new(-1.0, 1.0, -0.5).is_err());
        assert!(GridSpec::new(0.0, 0.05, 0.1).is_err());
    }

    #[test]
    fn test_to_cell_uses_row_for_y() {
        let spec = GridSpec::new(0.0, 10.0, 1.0).unwrap();
        assert_eq!(spec.to_cell(2.5, 7.5), CellAddress::new(7, 2));
    }

    #[test]
    fn test_to_cell_boundary_and_negative() {
        let spec = GridSpec::new(0.0, 10.0, 1.0).unwrap();
        assert_eq!(spec.to_cell(3.0, 3.0), CellAddress::new(3, 3));
        assert_eq!(spec.to_cell(2.999, 2.999), CellAddress::new(2, 2));
        assert_eq!(spec.to_cell(-0.5, -0.5), CellAddress::new(-1, -1));
    }

    #[test]
    fn test_locate_rejects_off_grid_and_non_finite() {
        let spec = GridSpec::new(0.0, 10.0, 1.0).unwrap();
        assert_eq!(spec.locate(2.5, 7.5), Some(CellAddress::new(7, 2)));
        assert_eq!(spec.locate(10.0, 5.0), None);
        assert_eq!(spec.locate(-0.5, 5.0), None);
        assert_eq!(spec.locate(f64::NAN, 5.0), None);
        assert_eq!(spec.locate(5.0, f64::NAN), None);
        assert_eq!(spec.locate(f64::INFINITY, 5.0), None);
        assert_eq!(spec.locate(5.0, f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_to_center() {
        let spec = GridSpec::new(-1.0, 1.0, 0.5).unwrap();
        let c = spec.to_center(CellAddress::new(0, 3));
        assert_relative_eq!(c.x, 0.75);
        assert_relative_eq!(c.y, -0.75);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let spec = GridSpec::default();
        let n = spec.size() as i32;
        for row in 0..n {
            for col in 0..n {
                let addr = CellAddress::new(row, col);
                let c = spec.to_center(addr);
                assert_eq!(spec.to_cell(c.x, c.y), addr);
            }
        }
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(CellAddress::new(0, 0), 3));
        assert!(in_bounds(CellAddress::new(2, 2), 3));
        assert!(!in_bounds(CellAddress::new(3, 0), 3));
        assert!(!in_bounds(CellAddress::new(0, -1), 3));
    }
}
