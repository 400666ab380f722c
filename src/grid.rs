//! Board: fixed `rows × columns` cells, row-major, with 4-neighbour adjacency.

use crate::theme::Rgba;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell index {index} out of range (grid has {len} cells)")]
    OutOfRange { index: usize, len: usize },
}

/// One board cell.
///
/// `is_fixed`: holds a committed block. `is_active`: holds a block of the
/// placement in progress. Empty means neither. A cell is never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub color: Rgba,
    pub is_fixed: bool,
    pub is_active: bool,
    /// Marked by the hammer power-up; only ever set on fixed cells.
    pub is_under_modifier: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            color: Rgba::EMPTY,
            is_fixed: false,
            is_active: false,
            is_under_modifier: false,
        }
    }
}

impl Cell {
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.is_fixed && !self.is_active
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Zero-sized dimensions are rejected by `GameConfig::validate` before we get here.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![Cell::default(); columns * rows],
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn check(&self, index: usize) -> Result<(), GridError> {
        if index < self.cells.len() {
            Ok(())
        } else {
            Err(GridError::OutOfRange {
                index,
                len: self.cells.len(),
            })
        }
    }

    pub fn cell(&self, index: usize) -> Result<&Cell, GridError> {
        self.check(index)?;
        Ok(&self.cells[index])
    }

    pub fn cell_mut(&mut self, index: usize) -> Result<&mut Cell, GridError> {
        self.check(index)?;
        Ok(&mut self.cells[index])
    }

    /// (row, column) of an index.
    #[inline]
    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.columns, index % self.columns)
    }

    /// Index of (row, column), or None when outside the board.
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.columns).then_some(row * self.columns + col)
    }

    /// Vertical neighbours differ by `columns`; horizontal ones by 1 and must share a row,
    /// so the last cell of a row never touches the first cell of the next.
    pub fn are_adjacent(&self, i: usize, j: usize) -> bool {
        let diff = i.abs_diff(j);
        diff == self.columns || (diff == 1 && i / self.columns == j / self.columns)
    }

    /// Empty the cell: drop every flag and restore the default colour.
    pub fn reset(&mut self, index: usize) -> Result<(), GridError> {
        *self.cell_mut(index)? = Cell::default();
        Ok(())
    }

    pub fn reset_all(&mut self) {
        self.cells.fill(Cell::default());
    }

    pub fn fixed_indices(&self) -> Vec<usize> {
        self.indices_where(|c| c.is_fixed)
    }

    /// Every cell that is not fixed. Active cells count as non-fixed here.
    pub fn non_fixed_indices(&self) -> Vec<usize> {
        self.indices_where(|c| !c.is_fixed)
    }

    pub fn fixed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_fixed).count()
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_active).count()
    }

    fn indices_where(&self, pred: impl Fn(&Cell) -> bool) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(c))
            .map(|(i, _)| i)
            .collect()
    }

    /// Mark `index` fixed with `color`. Used by tests and save loading.
    pub fn fix(&mut self, index: usize, color: Rgba) -> Result<(), GridError> {
        let cell = self.cell_mut(index)?;
        cell.color = color;
        cell.is_fixed = true;
        cell.is_active = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_symmetric_and_respects_rows() {
        let grid = Grid::new(5, 5);
        for i in 0..grid.len() {
            for j in 0..grid.len() {
                assert_eq!(grid.are_adjacent(i, j), grid.are_adjacent(j, i), "{i} {j}");
            }
        }
        assert!(!grid.are_adjacent(4, 5));
        assert!(!grid.are_adjacent(9, 10));
        assert!(grid.are_adjacent(3, 4));
        assert!(grid.are_adjacent(4, 9));
        assert!(!grid.are_adjacent(0, 6));
        assert!(!grid.are_adjacent(7, 7));
    }

    #[test]
    fn every_cell_has_at_most_four_neighbours() {
        let grid = Grid::new(4, 3);
        for i in 0..grid.len() {
            let n = (0..grid.len()).filter(|&j| grid.are_adjacent(i, j)).count();
            let (r, c) = grid.row_col(i);
            let expected = usize::from(r > 0)
                + usize::from(r + 1 < grid.rows())
                + usize::from(c > 0)
                + usize::from(c + 1 < grid.columns());
            assert_eq!(n, expected, "cell {i}");
        }
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut grid = Grid::new(5, 5);
        assert_eq!(
            grid.cell(25),
            Err(GridError::OutOfRange { index: 25, len: 25 })
        );
        assert!(grid.reset(100).is_err());
        assert!(grid.cell(24).is_ok());
    }

    #[test]
    fn reset_clears_flags_and_colour() {
        let mut grid = Grid::new(3, 3);
        let red = Rgba::opaque(255, 0, 0);
        grid.fix(4, red).unwrap();
        grid.cell_mut(4).unwrap().is_under_modifier = true;
        assert!(!grid.cell(4).unwrap().is_empty());
        grid.reset(4).unwrap();
        assert_eq!(*grid.cell(4).unwrap(), Cell::default());
        assert!(grid.cell(4).unwrap().is_empty());
    }

    #[test]
    fn row_col_and_index_of_agree() {
        let grid = Grid::new(5, 4);
        for i in 0..grid.len() {
            let (r, c) = grid.row_col(i);
            assert_eq!(grid.index_of(r, c), Some(i));
        }
        assert_eq!(grid.index_of(4, 0), None);
        assert_eq!(grid.index_of(0, 5), None);
    }
}
