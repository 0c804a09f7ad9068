//! Match evaluation - pair validity, board completion and pair search.

use crate::board::Board;
use crate::types::{HintPair, MATCH_SUM};

/// Two values match when they are equal or sum to ten.
///
/// Callers filter out empty and matched cells before asking.
#[inline]
pub fn is_valid_match(a: u8, b: u8) -> bool {
    a == b || a as u16 + b as u16 == MATCH_SUM as u16
}

/// True when every cell is empty or matched.
pub fn is_board_cleared(board: &Board) -> bool {
    board.cells().iter().all(|c| c.is_settled())
}

/// First matchable pair in board order, if any.
///
/// Enumerates the first member by ascending board index and the second member
/// among the cells after it, so an unchanged board always yields the same pair.
pub fn find_matchable_pair(board: &Board) -> Option<HintPair> {
    let cells = board.cells();
    for (i, first) in cells.iter().enumerate() {
        let Some(a) = first.value.filter(|_| !first.matched) else {
            continue;
        };
        for second in &cells[i + 1..] {
            let Some(b) = second.value.filter(|_| !second.matched) else {
                continue;
            };
            if is_valid_match(a, b) {
                return Some(HintPair {
                    first: first.id,
                    second: second.id,
                });
            }
        }
    }
    None
}
