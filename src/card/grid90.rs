//! 90-ball ticket grid (3 rows x 9 columns, one EMPTY slot per row)

use super::Cell;
use crate::error::Precondition;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const ROWS: usize = 3;
pub const COLUMNS: usize = 9;

/// Populated slots on a ticket: eight per row.
pub const NUMBERS: usize = ROWS * (COLUMNS - 1);

/// A validated 3x9 ticket.
///
/// Every row has exactly one EMPTY slot. Column `k` draws from
/// [`Grid90::column_range`] and its values increase top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[[Cell; COLUMNS]; ROWS]", into = "[[Cell; COLUMNS]; ROWS]")]
pub struct Grid90 {
    rows: [[Cell; COLUMNS]; ROWS],
}

impl Grid90 {
    /// The value range for column `col`: 1-9, 10-19, ..., 70-79, 80-90.
    pub fn column_range(col: usize) -> RangeInclusive<u8> {
        match col {
            0 => 1..=9,
            c if c == COLUMNS - 1 => 80..=90,
            c => {
                let low = c as u8 * 10;
                low..=low + 9
            }
        }
    }

    /// Build a ticket from numbers, with `None` marking EMPTY slots.
    pub fn from_rows(rows: [[Option<u8>; COLUMNS]; ROWS]) -> Result<Self, Precondition> {
        let cells = rows.map(|row| row.map(|slot| slot.map_or(Cell::Empty, Cell::Number)));
        Self::from_cells(cells)
    }

    /// Validate raw cells: one EMPTY per row, no FREE, values in their
    /// column range and strictly ascending down each column.
    pub fn from_cells(rows: [[Cell; COLUMNS]; ROWS]) -> Result<Self, Precondition> {
        for (r, row) in rows.iter().enumerate() {
            let empties = row.iter().filter(|cell| **cell == Cell::Empty).count();
            if empties != 1 {
                return Err(malformed(format!("row {} has {} empty slots", r, empties)));
            }
            if row.contains(&Cell::Free) {
                return Err(malformed(format!("row {} has a FREE slot", r)));
            }
        }

        for col in 0..COLUMNS {
            let range = Self::column_range(col);
            let mut previous: Option<u8> = None;
            for row in rows.iter() {
                let Some(n) = row[col].number() else { continue };
                if !range.contains(&n) {
                    return Err(malformed(format!("{} does not belong in column {}", n, col)));
                }
                if previous.is_some_and(|p| p >= n) {
                    return Err(malformed(format!("column {} is not strictly ascending", col)));
                }
                previous = Some(n);
            }
        }

        Ok(Self { rows })
    }

    /// Generator output is valid by construction.
    pub(super) fn from_generated(rows: [[Cell; COLUMNS]; ROWS]) -> Self {
        debug_assert!(Self::from_cells(rows).is_ok());
        Self { rows }
    }

    pub fn rows(&self) -> &[[Cell; COLUMNS]; ROWS] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.rows[row][col]
    }

    /// Values in column `col`, top to bottom, skipping EMPTY.
    pub fn column(&self, col: usize) -> Vec<u8> {
        self.rows.iter().filter_map(|row| row[col].number()).collect()
    }

    /// Every populated value on the ticket.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().flatten().filter_map(|cell| cell.number())
    }
}

impl TryFrom<[[Cell; COLUMNS]; ROWS]> for Grid90 {
    type Error = Precondition;

    fn try_from(rows: [[Cell; COLUMNS]; ROWS]) -> Result<Self, Self::Error> {
        Self::from_cells(rows)
    }
}

impl From<Grid90> for [[Cell; COLUMNS]; ROWS] {
    fn from(grid: Grid90) -> Self {
        grid.rows
    }
}

fn malformed(reason: String) -> Precondition {
    Precondition::MalformedCard(format!("90-ball ticket: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_rows() -> [[Option<u8>; COLUMNS]; ROWS] {
        [
            [None, Some(10), Some(20), Some(30), Some(40), Some(50), Some(60), Some(70), Some(80)],
            [Some(1), None, Some(21), Some(31), Some(41), Some(51), Some(61), Some(71), Some(81)],
            [Some(2), Some(12), None, Some(32), Some(42), Some(52), Some(62), Some(72), Some(90)],
        ]
    }

    #[test]
    fn test_column_ranges() {
        assert_eq!(Grid90::column_range(0), 1..=9);
        assert_eq!(Grid90::column_range(1), 10..=19);
        assert_eq!(Grid90::column_range(7), 70..=79);
        assert_eq!(Grid90::column_range(8), 80..=90);
        let total: usize = (0..COLUMNS).map(|c| Grid90::column_range(c).count()).sum();
        assert_eq!(total, 90);
    }

    #[test]
    fn test_valid_ticket_accepted() {
        let grid = Grid90::from_rows(fixed_rows()).unwrap();
        assert_eq!(grid.numbers().count(), NUMBERS);
        assert_eq!(grid.column(0), vec![1, 2]);
        assert_eq!(grid.cell(0, 0), Cell::Empty);
    }

    #[test]
    fn test_row_without_empty_rejected() {
        let mut rows = fixed_rows();
        rows[0][0] = Some(3);
        assert!(Grid90::from_rows(rows).is_err());
    }

    #[test]
    fn test_row_with_two_empties_rejected() {
        let mut rows = fixed_rows();
        rows[1][3] = None;
        assert!(Grid90::from_rows(rows).is_err());
    }

    #[test]
    fn test_descending_column_rejected() {
        let mut rows = fixed_rows();
        rows[1][8] = Some(85);
        rows[2][8] = Some(84);
        assert!(Grid90::from_rows(rows).is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut rows = fixed_rows();
        rows[0][1] = Some(9);
        assert!(matches!(
            Grid90::from_rows(rows),
            Err(Precondition::MalformedCard(_))
        ));
    }

    #[test]
    fn test_free_slot_rejected() {
        let mut cells = Grid90::from_rows(fixed_rows()).unwrap().rows;
        cells[0][0] = Cell::Free;
        cells[0][1] = Cell::Empty;
        assert!(Grid90::from_cells(cells).is_err());
    }
}
