//! 75-ball card grid (5x5, FREE center)

use super::Cell;
use crate::error::Precondition;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Rows and columns on a 75-ball card.
pub const SIZE: usize = 5;

/// Row and column of the FREE slot.
pub const CENTER: usize = 2;

/// Numbers available to each column (B, I, N, G, O).
const COLUMN_SPAN: u8 = 15;

/// A validated 5x5 grid. Column `k` holds values in `[15k+1, 15k+15]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[[Cell; SIZE]; SIZE]", into = "[[Cell; SIZE]; SIZE]")]
pub struct Grid75 {
    rows: [[Cell; SIZE]; SIZE],
}

impl Grid75 {
    /// The value range for column `col`.
    pub fn column_range(col: usize) -> RangeInclusive<u8> {
        let low = col as u8 * COLUMN_SPAN + 1;
        low..=low + COLUMN_SPAN - 1
    }

    /// Build a grid from numbers, with `None` marking the FREE center.
    pub fn from_rows(rows: [[Option<u8>; SIZE]; SIZE]) -> Result<Self, Precondition> {
        let cells = rows.map(|row| row.map(|slot| slot.map_or(Cell::Free, Cell::Number)));
        Self::from_cells(cells)
    }

    /// Validate raw cells: FREE only at the center, every column in range,
    /// no repeated numbers.
    pub fn from_cells(rows: [[Cell; SIZE]; SIZE]) -> Result<Self, Precondition> {
        let mut seen: u128 = 0;
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let at_center = r == CENTER && c == CENTER;
                match *cell {
                    Cell::Free if at_center => {}
                    Cell::Number(n) if !at_center => {
                        if !Self::column_range(c).contains(&n) {
                            return Err(malformed(format!(
                                "{} at row {} does not belong in column {}",
                                n, r, c
                            )));
                        }
                        let bit = 1u128 << n;
                        if seen & bit != 0 {
                            return Err(malformed(format!("{} appears twice", n)));
                        }
                        seen |= bit;
                    }
                    other => {
                        return Err(malformed(format!(
                            "unexpected {:?} at row {}, column {}",
                            other, r, c
                        )));
                    }
                }
            }
        }
        Ok(Self { rows })
    }

    /// Generator output is valid by construction.
    pub(super) fn from_generated(rows: [[Cell; SIZE]; SIZE]) -> Self {
        debug_assert!(Self::from_cells(rows).is_ok());
        Self { rows }
    }

    pub fn rows(&self) -> &[[Cell; SIZE]; SIZE] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.rows[row][col]
    }

    /// Values in column `col`, top to bottom, skipping FREE.
    pub fn column(&self, col: usize) -> Vec<u8> {
        self.rows.iter().filter_map(|row| row[col].number()).collect()
    }
}

impl TryFrom<[[Cell; SIZE]; SIZE]> for Grid75 {
    type Error = Precondition;

    fn try_from(rows: [[Cell; SIZE]; SIZE]) -> Result<Self, Self::Error> {
        Self::from_cells(rows)
    }
}

impl From<Grid75> for [[Cell; SIZE]; SIZE] {
    fn from(grid: Grid75) -> Self {
        grid.rows
    }
}

fn malformed(reason: String) -> Precondition {
    Precondition::MalformedCard(format!("75-ball grid: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_rows() -> [[Option<u8>; SIZE]; SIZE] {
        [
            [Some(1), Some(16), Some(31), Some(46), Some(61)],
            [Some(2), Some(17), Some(32), Some(47), Some(62)],
            [Some(3), Some(18), None, Some(48), Some(63)],
            [Some(4), Some(19), Some(34), Some(49), Some(64)],
            [Some(5), Some(20), Some(35), Some(50), Some(65)],
        ]
    }

    #[test]
    fn test_column_ranges() {
        assert_eq!(Grid75::column_range(0), 1..=15);
        assert_eq!(Grid75::column_range(2), 31..=45);
        assert_eq!(Grid75::column_range(4), 61..=75);
    }

    #[test]
    fn test_valid_grid_accepted() {
        let grid = Grid75::from_rows(fixed_rows()).unwrap();
        assert_eq!(grid.cell(2, 2), Cell::Free);
        assert_eq!(grid.column(2), vec![31, 32, 34, 35]);
    }

    #[test]
    fn test_missing_free_center_rejected() {
        let mut rows = fixed_rows();
        rows[2][2] = Some(33);
        assert!(Grid75::from_rows(rows).is_err());
    }

    #[test]
    fn test_extra_free_rejected() {
        let mut rows = fixed_rows();
        rows[0][0] = None;
        assert!(Grid75::from_rows(rows).is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut rows = fixed_rows();
        rows[0][1] = Some(15);
        assert!(matches!(
            Grid75::from_rows(rows),
            Err(Precondition::MalformedCard(_))
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut rows = fixed_rows();
        rows[1][0] = Some(1);
        assert!(Grid75::from_rows(rows).is_err());
    }
}
