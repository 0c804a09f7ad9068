//! Board module - manages the game grid
//!
//! The board is a `rows x cols` grid stored as a flat vector in row-major order,
//! so cell `(row, col)` always lives at index `row * cols + col`.
//! Every position keeps its [`CellId`] for the lifetime of the board; only the
//! value and the matched flag change.

use crate::rng::ValueGenerator;
use crate::types::{CellId, CellValue, Level};

/// A single grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub id: CellId,
    pub row: u8,
    pub col: u8,
    pub value: CellValue,
    pub matched: bool,
}

impl Cell {
    /// A filled, unmatched cell can take part in a match
    pub fn is_eligible(&self) -> bool {
        self.value.is_some() && !self.matched
    }

    /// Empty or already matched
    pub fn is_settled(&self) -> bool {
        !self.is_eligible()
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: u8,
    cols: u8,
    /// Flat array of cells, row-major order (row * cols + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create an all-empty board with ids assigned row-major from 1
    pub fn empty(rows: u8, cols: u8) -> Self {
        let mut cells = Vec::with_capacity(rows as usize * cols as usize);
        let mut next_id = 1u32;
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell {
                    id: CellId(next_id),
                    row,
                    col,
                    value: None,
                    matched: false,
                });
                next_id += 1;
            }
        }
        Self { rows, cols, cells }
    }

    /// Lay out a fresh board for `level`.
    ///
    /// The first `min(initial_filled_rows * cols, rows * cols)` positions receive
    /// values from the generator in order; everything else starts empty.
    pub fn for_level(level: &Level, generator: &mut ValueGenerator) -> Self {
        let mut board = Self::empty(level.rows, level.cols);
        let values = generator.generate(level.initial_cells());

        let fill_rows = level.initial_filled_rows;
        let mut next = values.iter().copied();
        for cell in board.cells.iter_mut() {
            if cell.row >= fill_rows {
                break;
            }
            match next.next() {
                Some(v) => cell.value = Some(v),
                None => break,
            }
        }
        board
    }

    /// Build a board from explicit values (row-major). Missing trailing values are empty.
    pub fn from_values(rows: u8, cols: u8, values: &[CellValue]) -> Self {
        let mut board = Self::empty(rows, cols);
        for (cell, value) in board.cells.iter_mut().zip(values.iter()) {
            cell.value = *value;
        }
        board
    }

    /// Calculate flat index from (row, col) coordinates
    #[inline(always)]
    pub fn index(&self, row: u8, col: u8) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get cell at position (row, col)
    pub fn get(&self, row: u8, col: u8) -> Option<&Cell> {
        self.index(row, col).map(|idx| &self.cells[idx])
    }

    /// Look up a cell by id.
    ///
    /// Ids are dense and row-major, so this is an index computation plus a check.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.cells.get(idx).filter(|c| c.id == id)
    }

    fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.cells.get_mut(idx).filter(|c| c.id == id)
    }

    /// Mark a cell as matched. Returns false for unknown or ineligible cells.
    pub fn mark_matched(&mut self, id: CellId) -> bool {
        match self.cell_mut(id) {
            Some(cell) if cell.is_eligible() => {
                cell.matched = true;
                true
            }
            _ => false,
        }
    }

    /// Overwrite every cell of `row` with `values` and reset their matched flags.
    ///
    /// Returns false if the row is out of bounds or `values` is not exactly one row long.
    pub fn fill_row(&mut self, row: u8, values: &[u8]) -> bool {
        if row >= self.rows || values.len() != self.cols as usize {
            return false;
        }
        let start = row as usize * self.cols as usize;
        for (cell, &v) in self.cells[start..start + values.len()].iter_mut().zip(values) {
            cell.value = Some(v);
            cell.matched = false;
        }
        true
    }

    /// Number of cells holding a value (matched or not)
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.value.is_some()).count()
    }

    /// Number of cells still available for matching
    pub fn remaining_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_eligible()).count()
    }

    /// Iterate over cells that can still be matched, in board order
    pub fn eligible_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(|c| c.is_eligible())
    }
}
