use crate::audio::Instrument;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROWS: usize = 24;
pub const DEFAULT_COLUMNS: usize = 48;
pub const COLUMN_INCREMENT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub active: bool,
    pub instrument: Instrument,
}

impl Cell {
    pub fn inactive(instrument: Instrument) -> Self {
        Self {
            active: false,
            instrument,
        }
    }
}

/// Rows are pitch lanes, columns are time steps. Every row always has the
/// same length; the column count only ever grows.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
    columns: usize,
}

impl Grid {
    pub fn new(rows: usize, columns: usize, instrument: Instrument) -> Self {
        Self {
            cells: vec![vec![Cell::inactive(instrument); columns]; rows],
            columns,
        }
    }

    /// Adopts a deserialized matrix after checking it is rectangular and non-empty.
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Result<Self> {
        let columns = match cells.first() {
            Some(row) => row.len(),
            None => return Err(Error::MalformedGrid("grid has no rows".into())),
        };
        if columns == 0 {
            return Err(Error::MalformedGrid("grid has no columns".into()));
        }
        if let Some((i, row)) = cells.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(Error::MalformedGrid(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                columns
            )));
        }
        Ok(Self { cells, columns })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.cells
    }

    /// Flips a cell and returns its new `active` state. A newly activated
    /// cell takes the `current` instrument; a deactivated one keeps its own.
    pub fn toggle(&mut self, row: usize, col: usize, current: Instrument) -> Result<bool> {
        let (rows, cols) = (self.rows(), self.columns);
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(Error::IndexOutOfRange {
                row,
                col,
                rows,
                cols,
            })?;

        cell.active = !cell.active;
        if cell.active {
            cell.instrument = current;
        }
        Ok(cell.active)
    }

    pub fn add_columns(&mut self, increment: usize, instrument: Instrument) {
        for row in &mut self.cells {
            row.extend(std::iter::repeat_n(Cell::inactive(instrument), increment));
        }
        self.columns += increment;
    }

    pub fn reset(&mut self) {
        for row in &mut self.cells {
            for cell in row {
                cell.active = false;
            }
        }
    }

    /// Active cells of one column as `(row, instrument)`, top row first.
    pub fn active_in_column(&self, col: usize) -> impl Iterator<Item = (usize, Instrument)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(row, cells)| match cells.get(col) {
                Some(cell) if cell.active => Some((row, cell.instrument)),
                _ => None,
            })
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.active).count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLUMNS, Instrument::default())
    }
}
