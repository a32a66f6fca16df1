//! Bresenham ray tracing between grid cells
//!
//! Integer-only error accumulation. The sequence contains both endpoints, every step
//! moves to one of the 8 neighbours, and no cell is emitted twice in a row.

use super::grid_spec::CellAddress;

/// Iterator over the cells of a discrete line, start and end included
#[derive(Debug, Clone)]
pub struct BresenhamIter {
    current: CellAddress,
    end: CellAddress,
    d_col: i32,
    d_row: i32,
    step_col: i32,
    step_row: i32,
    err: i32,
    done: bool,
}

impl BresenhamIter {
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let d_col = (end.col - start.col).abs();
        let d_row = -(end.row - start.row).abs();
        Self {
            current: start,
            end,
            d_col,
            d_row,
            step_col: if start.col < end.col { 1 } else { -1 },
            step_row: if start.row < end.row { 1 } else { -1 },
            err: d_col + d_row,
            done: false,
        }
    }
}

impl Iterator for BresenhamIter {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let cell = self.current;
        if cell == self.end {
            self.done = true;
            return Some(cell);
        }

        let e2 = 2 * self.err;
        if e2 >= self.d_row {
            self.err += self.d_row;
            self.current.col += self.step_col;
        }
        if e2 <= self.d_col {
            self.err += self.d_col;
            self.current.row += self.step_row;
        }

        Some(cell)
    }
}

/// Ordered cells on the line from `start` to `end`
pub fn trace(start: CellAddress, end: CellAddress) -> Vec<CellAddress> {
    BresenhamIter::new(start, end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn check_line(start: CellAddress, end: CellAddress) {
        let cells = trace(start, end);
        assert_eq!(cells.first(), Some(&start));
        assert_eq!(cells.last(), Some(&end));

        for w in cells.windows(2) {
            let dr = (w[1].row - w[0].row).abs();
            let dc = (w[1].col - w[0].col).abs();
            assert!(dr <= 1 && dc <= 1, "not 8-connected: {:?} -> {:?}", w[0], w[1]);
            assert!(w[0] != w[1], "repeated cell {:?}", w[0]);
        }

        let expected = (end.col - start.col).abs().max((end.row - start.row).abs()) as usize + 1;
        assert!(
            cells.len() + 1 >= expected && cells.len() <= expected + 1,
            "length {} far from {}",
            cells.len(),
            expected
        );
    }

    #[test]
    fn test_trace_to_self() {
        let a = CellAddress::new(4, 7);
        assert_eq!(trace(a, a), vec![a]);
    }

    #[test]
    fn test_trace_horizontal() {
        let cells = trace(CellAddress::new(2, 0), CellAddress::new(2, 3));
        let cols: Vec<i32> = cells.iter().map(|c| c.col).collect();
        assert_eq!(cols, vec![0, 1, 2, 3]);
        assert!(cells.iter().all(|c| c.row == 2));
    }

    #[test]
    fn test_trace_diagonal_reverse() {
        let cells = trace(CellAddress::new(3, 3), CellAddress::new(0, 0));
        assert_eq!(
            cells,
            vec![
                CellAddress::new(3, 3),
                CellAddress::new(2, 2),
                CellAddress::new(1, 1),
                CellAddress::new(0, 0),
            ]
        );
    }

    #[test]
    fn test_trace_random_lines() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let start = CellAddress::new(rng.gen_range(-50..50), rng.gen_range(-50..50));
            let end = CellAddress::new(rng.gen_range(-50..50), rng.gen_range(-50..50));
            check_line(start, end);
        }
    }

    #[test]
    fn test_trace_is_restartable() {
        let start = CellAddress::new(1, 9);
        let end = CellAddress::new(12, -4);
        assert_eq!(trace(start, end), trace(start, end));
    }
}
