//! Card generation
//!
//! Columns are filled from shuffled pools (Fisher-Yates via
//! `SliceRandom::shuffle`), so every valid layout is equally likely.

use super::grid75::{self, Grid75};
use super::grid90::{self, Grid90};
use super::{Card, CardId, Cell, Format, Layout};
use rand::prelude::*;

/// Generate a new random card for `format`.
pub fn generate(format: Format) -> Card {
    generate_with_rng(format, &mut rand::rng())
}

/// Generate a card using a specific RNG (for testing/seeding).
pub fn generate_with_rng<R: Rng + ?Sized>(format: Format, rng: &mut R) -> Card {
    let id = CardId::random(rng);
    let layout = match format {
        Format::Ball75 => Layout::Ball75(generate_75(rng)),
        Format::Ball90 => Layout::Ball90(generate_90(rng)),
    };
    Card::new(id, layout)
}

fn generate_75<R: Rng + ?Sized>(rng: &mut R) -> Grid75 {
    let mut rows = [[Cell::Free; grid75::SIZE]; grid75::SIZE];
    for col in 0..grid75::SIZE {
        let mut pool: Vec<u8> = Grid75::column_range(col).collect();
        pool.shuffle(rng);
        for (row, value) in pool.into_iter().take(grid75::SIZE).enumerate() {
            rows[row][col] = Cell::Number(value);
        }
    }
    rows[grid75::CENTER][grid75::CENTER] = Cell::Free;
    Grid75::from_generated(rows)
}

fn generate_90<R: Rng + ?Sized>(rng: &mut R) -> Grid90 {
    let mut pools: Vec<Vec<u8>> = (0..grid90::COLUMNS)
        .map(|col| {
            let mut pool: Vec<u8> = Grid90::column_range(col).collect();
            pool.shuffle(rng);
            pool
        })
        .collect();

    let mut rows = [[Cell::Empty; grid90::COLUMNS]; grid90::ROWS];
    for row in rows.iter_mut() {
        let empty = rng.random_range(0..grid90::COLUMNS);
        for (col, slot) in row.iter_mut().enumerate() {
            if col == empty {
                continue;
            }
            // Pools hold at least 9 values and give up at most 3
            if let Some(value) = pools[col].pop() {
                *slot = Cell::Number(value);
            }
        }
    }

    // Numbers increase down each column; EMPTY slots stay where they are
    for col in 0..grid90::COLUMNS {
        let mut values: Vec<u8> = rows.iter().filter_map(|row| row[col].number()).collect();
        values.sort_unstable();
        let mut sorted = values.into_iter();
        for row in rows.iter_mut() {
            if let Cell::Number(_) = row[col] {
                if let Some(value) = sorted.next() {
                    row[col] = Cell::Number(value);
                }
            }
        }
    }

    Grid90::from_generated(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn grid_75(card: &Card) -> &Grid75 {
        match card.layout() {
            Layout::Ball75(grid) => grid,
            Layout::Ball90(_) => panic!("expected a 75-ball card"),
        }
    }

    fn grid_90(card: &Card) -> &Grid90 {
        match card.layout() {
            Layout::Ball90(grid) => grid,
            Layout::Ball75(_) => panic!("expected a 90-ball card"),
        }
    }

    #[test]
    fn test_generate_matches_format() {
        assert_eq!(generate(Format::Ball75).format(), Format::Ball75);
        assert_eq!(generate(Format::Ball90).format(), Format::Ball90);
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let card1 = generate_with_rng(Format::Ball90, &mut rng1);
        let card2 = generate_with_rng(Format::Ball90, &mut rng2);

        assert_eq!(card1, card2);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<CardId> = (0..200).map(|_| generate(Format::Ball75).id()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_every_75_value_appears_in_each_column() {
        // Over many cards every value of a column's range should show up
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 76];
        for _ in 0..300 {
            let card = generate_with_rng(Format::Ball75, &mut rng);
            for n in card.numbers() {
                seen[n as usize] = true;
            }
        }
        let missing: Vec<usize> = (1..=75).filter(|n| !seen[*n]).collect();
        assert!(missing.is_empty(), "never generated: {:?}", missing);
    }

    #[test]
    fn test_75_row_placement_is_roughly_uniform() {
        // Each of the 15 values of column B lands in row 0 about 1/15 of the time
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 15_000;
        let mut counts = [0u32; 16];
        for _ in 0..trials {
            let card = generate_with_rng(Format::Ball75, &mut rng);
            if let Some(n) = grid_75(&card).cell(0, 0).number() {
                counts[n as usize] += 1;
            }
        }
        for (value, count) in counts.iter().enumerate().skip(1) {
            assert!(
                (800..=1200).contains(count),
                "value {} landed top-left {} times out of {}",
                value,
                count,
                trials
            );
        }
    }

    #[test]
    fn test_90_empty_column_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(5);
        let trials = 9_000;
        let mut counts = [0u32; grid90::COLUMNS];
        for _ in 0..trials {
            let card = generate_with_rng(Format::Ball90, &mut rng);
            let grid = grid_90(&card);
            if let Some(col) = (0..grid90::COLUMNS).find(|c| grid.cell(0, *c) == Cell::Empty) {
                counts[col] += 1;
            }
        }
        for (col, count) in counts.iter().enumerate() {
            assert!(
                (800..=1200).contains(count),
                "column {} was empty {} times out of {}",
                col,
                count,
                trials
            );
        }
    }

    proptest! {
        /// Property: each 75-ball column holds 5 distinct values of its range, center is FREE
        #[test]
        fn prop_75_card_shape(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let card = generate_with_rng(Format::Ball75, &mut rng);
            let grid = grid_75(&card);
            prop_assert_eq!(grid.cell(grid75::CENTER, grid75::CENTER), Cell::Free);
            for col in 0..grid75::SIZE {
                let values = grid.column(col);
                let expected = if col == grid75::CENTER { 4 } else { 5 };
                prop_assert_eq!(values.len(), expected);
                let distinct: HashSet<u8> = values.iter().copied().collect();
                prop_assert_eq!(distinct.len(), values.len());
                let range = Grid75::column_range(col);
                prop_assert!(values.iter().all(|v| range.contains(v)));
            }
            prop_assert!(card.check_shape().is_ok());
        }

        /// Property: 90-ball tickets have 24 numbers, one EMPTY per row, ascending columns
        #[test]
        fn prop_90_card_shape(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let card = generate_with_rng(Format::Ball90, &mut rng);
            let grid = grid_90(&card);
            prop_assert_eq!(grid.numbers().count(), 24);
            for row in grid.rows() {
                prop_assert_eq!(row.iter().filter(|c| **c == Cell::Empty).count(), 1);
            }
            for col in 0..grid90::COLUMNS {
                let values = grid.column(col);
                let range = Grid90::column_range(col);
                prop_assert!(values.iter().all(|v| range.contains(v)));
                prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
            }
            prop_assert!(Grid90::from_cells(*grid.rows()).is_ok());
        }
    }
}
