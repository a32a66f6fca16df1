//! Line-based text format for certainty grids
//!
//! One line per grid row, values separated by single spaces. Values are written with
//! the shortest representation that parses back to the same `f64`, so a save/load
//! cycle is exact.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::DMatrix;

use crate::common::{NavError, NavResult};

/// Write `grid` row by row
pub fn write_grid<W: Write>(grid: &DMatrix<f64>, mut writer: W) -> NavResult<()> {
    for row in grid.row_iter() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a grid. Blank lines are ignored; every other line must hold the same
/// number of finite values.
pub fn read_grid<R: BufRead>(reader: R) -> NavResult<DMatrix<f64>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(|token| {
                let value = token.parse::<f64>().map_err(|e| NavError::GridParseError {
                    line: line_no + 1,
                    message: format!("'{}': {}", token, e),
                })?;
                if !value.is_finite() {
                    return Err(NavError::GridParseError {
                        line: line_no + 1,
                        message: format!("'{}' is not a finite value", token),
                    });
                }
                Ok(value)
            })
            .collect::<NavResult<Vec<f64>>>()?;

        if let Some(first) = rows.first() {
            if first.len() != values.len() {
                return Err(NavError::GridParseError {
                    line: line_no + 1,
                    message: format!("expected {} values, found {}", first.len(), values.len()),
                });
            }
        }
        rows.push(values);
    }

    if rows.is_empty() {
        return Err(NavError::GridParseError {
            line: 0,
            message: "grid file is empty".to_string(),
        });
    }

    let ncols = rows[0].len();
    Ok(DMatrix::from_row_iterator(
        rows.len(),
        ncols,
        rows.into_iter().flatten(),
    ))
}

/// Save a grid to `path`, replacing any existing file
pub fn save_grid<P: AsRef<Path>>(grid: &DMatrix<f64>, path: P) -> NavResult<()> {
    let file = File::create(path.as_ref())?;
    write_grid(grid, BufWriter::new(file))?;
    log::info!(
        "Saved {}x{} grid to '{}'",
        grid.nrows(),
        grid.ncols(),
        path.as_ref().display()
    );
    Ok(())
}

/// Load a grid from `path`
pub fn load_grid<P: AsRef<Path>>(path: P) -> NavResult<DMatrix<f64>> {
    let file = File::open(path.as_ref())?;
    let grid = read_grid(BufReader::new(file))?;
    log::info!(
        "Loaded {}x{} grid from '{}'",
        grid.nrows(),
        grid.ncols(),
        path.as_ref().display()
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_format() {
        let grid = DMatrix::from_row_slice(2, 3, &[0.0, 7.5, 15.0, 1.25, 0.1, 3.0]);
        let mut out = Vec::new();
        write_grid(&grid, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 7.5 15\n1.25 0.1 3\n");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt");

        let grid = DMatrix::from_fn(6, 6, |r, c| (r as f64 * 0.37 + c as f64 / 3.0).sin() * 15.0);
        save_grid(&grid, &path).unwrap();
        let loaded = load_grid(&path).unwrap();

        assert_eq!(loaded.shape(), (6, 6));
        assert_eq!(loaded, grid);
    }

    #[test]
    fn test_read_tolerates_trailing_spaces_and_blank_lines() {
        let text = "1 2 \n\n3 4 \n";
        let grid = read_grid(Cursor::new(text)).unwrap();
        assert_eq!(grid, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_read_rejects_ragged_rows() {
        let err = read_grid(Cursor::new("1 2 3\n4 5\n")).unwrap_err();
        assert!(matches!(err, NavError::GridParseError { line: 2, .. }));
    }

    #[test]
    fn test_read_rejects_bad_tokens() {
        let err = read_grid(Cursor::new("1 x\n")).unwrap_err();
        assert!(matches!(err, NavError::GridParseError { line: 1, .. }));
    }

    #[test]
    fn test_read_rejects_non_finite_values() {
        for text in ["1 NaN\n", "1 2\ninf 3\n", "-inf 0\n", "1 2\n3 -NaN\n"] {
            let err = read_grid(Cursor::new(text)).unwrap_err();
            let expected_line = text.lines().position(|l| l.contains("inf") || l.contains("NaN")).unwrap() + 1;
            assert!(
                matches!(err, NavError::GridParseError { line, .. } if line == expected_line),
                "{:?}: {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_read_rejects_empty() {
        assert!(read_grid(Cursor::new("\n\n")).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_grid(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, NavError::IoError(_)));
    }
}
