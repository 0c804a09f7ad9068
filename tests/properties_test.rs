//! Property-based tests for generation, board layout and match evaluation.

use proptest::prelude::*;

use number_match::core::{
    find_matchable_pair, is_board_cleared, is_valid_match, Board, ValueGenerator,
};
use number_match::types::{CellValue, LEVELS};

fn cell_value() -> impl Strategy<Value = CellValue> {
    prop_oneof![1 => Just(None), 4 => (1u8..=9).prop_map(Some)]
}

/// A small board with arbitrary values and an arbitrary matched subset.
fn arb_board() -> impl Strategy<Value = Board> {
    (1u8..=6, 1u8..=6)
        .prop_flat_map(|(rows, cols)| {
            let n = rows as usize * cols as usize;
            (
                Just((rows, cols)),
                prop::collection::vec(cell_value(), n),
                prop::collection::vec(any::<bool>(), n),
            )
        })
        .prop_map(|((rows, cols), values, matched)| {
            let mut board = Board::from_values(rows, cols, &values);
            let ids: Vec<_> = board
                .cells()
                .iter()
                .zip(matched.iter())
                .filter(|(c, m)| **m && c.value.is_some())
                .map(|(c, _)| c.id)
                .collect();
            for id in ids {
                board.mark_matched(id);
            }
            board
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Output length equals the request and every digit is in [1, 9].
    #[test]
    fn prop_generate_length_and_range(seed in any::<u32>(), count in 0usize..200) {
        let values = ValueGenerator::new(seed).generate(count);
        prop_assert_eq!(values.len(), count);
        prop_assert!(values.iter().all(|v| (1..=9).contains(v)));
    }

    /// Same seed, same sequence.
    #[test]
    fn prop_generate_deterministic(seed in any::<u32>(), count in 0usize..64) {
        prop_assert_eq!(
            ValueGenerator::new(seed).generate(count),
            ValueGenerator::new(seed).generate(count)
        );
    }

    /// Filled count matches the level and empty cells are never matched.
    #[test]
    fn prop_board_fill_counts(seed in any::<u32>(), level_index in 0usize..LEVELS.len()) {
        let level = LEVELS[level_index];
        let board = Board::for_level(&level, &mut ValueGenerator::new(seed));

        prop_assert_eq!(board.len(), level.total_cells());
        prop_assert_eq!(board.filled_count(), level.initial_cells());
        prop_assert!(board.cells().iter().filter(|c| c.value.is_none()).all(|c| !c.matched));

        for (i, cell) in board.cells().iter().enumerate() {
            prop_assert_eq!(cell.id.0 as usize, i + 1);
            prop_assert_eq!(board.index(cell.row, cell.col), Some(i));
        }
    }

    #[test]
    fn prop_match_symmetric(a in 1u8..=9, b in 1u8..=9) {
        prop_assert_eq!(is_valid_match(a, b), is_valid_match(b, a));
    }

    /// Cleared iff no cell holds an unmatched value.
    #[test]
    fn prop_cleared_iff_no_eligible(board in arb_board()) {
        let eligible = board.cells().iter().any(|c| c.value.is_some() && !c.matched);
        prop_assert_eq!(is_board_cleared(&board), !eligible);
    }

    /// The search agrees with a brute-force scan and returns a valid pair.
    #[test]
    fn prop_find_pair_sound_and_complete(board in arb_board()) {
        let cells = board.cells();
        let mut exists = false;
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                if let (Some(x), Some(y)) = (a.value, b.value) {
                    if !a.matched && !b.matched && is_valid_match(x, y) {
                        exists = true;
                    }
                }
            }
        }

        match find_matchable_pair(&board) {
            None => prop_assert!(!exists),
            Some(pair) => {
                prop_assert!(exists);
                prop_assert_ne!(pair.first, pair.second);
                let first = board.cell(pair.first).copied().unwrap();
                let second = board.cell(pair.second).copied().unwrap();
                prop_assert!(first.is_eligible() && second.is_eligible());
                prop_assert!(is_valid_match(first.value.unwrap(), second.value.unwrap()));
                prop_assert_eq!(find_matchable_pair(&board), Some(pair));
            }
        }
    }

    /// Every chunk is a matching pair, so an even-sized batch always pairs up fully.
    #[test]
    fn prop_even_batch_fully_pairable(seed in any::<u32>(), pairs in 1usize..20) {
        let values = ValueGenerator::new(seed).generate(pairs * 2);
        // Classes {a, 10 - a}: matching is an equivalence on them.
        let mut counts = [0usize; 6];
        for v in values {
            counts[v.min(10 - v) as usize] += 1;
        }
        prop_assert!(counts.iter().all(|c| c % 2 == 0));
    }
}
