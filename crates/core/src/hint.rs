//! Hint scheduler - surfaces a matchable pair after the player goes idle.
//!
//! Cycle while a level is being played:
//!
//! 1. **Waiting**: armed for `last_interaction + idle_ms`.
//! 2. On expiry the board is scanned. A found pair is shown (**Showing**) and the
//!    slot is re-armed for `display_ms`; no pair leaves the scheduler **Dormant**
//!    until the next interaction.
//! 3. When the display time runs out the hint is cleared, the idle baseline moves
//!    to "now" and the cycle starts over.
//!
//! Any interaction cancels a pending wait or a visible hint and restarts step 1.
//! The scheduler owns exactly one [`TimerSlot`], so at most one hint deadline is
//! ever outstanding.

use crate::board::Board;
use crate::matching::find_matchable_pair;
use crate::timer::{TimerSlot, TimerToken};
use crate::types::{HintPair, HINT_DISPLAY_MS, HINT_IDLE_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintPhase {
    /// Not scheduling (no level in play)
    Off,
    /// Counting idle time
    Waiting,
    /// A pair is on display
    Showing(HintPair),
    /// Last scan found nothing; waits for an interaction
    Dormant,
}

/// Visible change produced by a hint deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintUpdate {
    Shown(HintPair),
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HintScheduler {
    idle_ms: u64,
    display_ms: u64,
    phase: HintPhase,
    timer: TimerSlot,
    last_interaction_ms: u64,
}

impl HintScheduler {
    pub fn new(idle_ms: u64, display_ms: u64) -> Self {
        Self {
            idle_ms,
            display_ms,
            phase: HintPhase::Off,
            timer: TimerSlot::new(),
            last_interaction_ms: 0,
        }
    }

    pub fn phase(&self) -> HintPhase {
        self.phase
    }

    /// The pair currently on display
    pub fn active(&self) -> Option<HintPair> {
        match self.phase {
            HintPhase::Showing(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn last_interaction_ms(&self) -> u64 {
        self.last_interaction_ms
    }

    pub fn deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    pub fn due(&self, now_ms: u64) -> Option<(u64, TimerToken)> {
        self.timer.due(now_ms)
    }

    /// Begin scheduling with `now_ms` as the idle baseline.
    pub fn start(&mut self, now_ms: u64) {
        self.last_interaction_ms = now_ms;
        self.phase = HintPhase::Waiting;
        self.timer.arm(now_ms.saturating_add(self.idle_ms));
    }

    /// Record a player interaction.
    ///
    /// Cancels any pending wait or visible hint and restarts the idle wait.
    /// Returns true if a visible hint was cleared. Ignored while `Off`.
    pub fn interact(&mut self, now_ms: u64) -> bool {
        if self.phase == HintPhase::Off {
            return false;
        }
        let cleared = self.active().is_some();
        self.start(now_ms);
        cleared
    }

    /// Stop scheduling and drop any visible hint. Returns true if one was visible.
    pub fn stop(&mut self) -> bool {
        let cleared = self.active().is_some();
        self.timer.cancel();
        self.phase = HintPhase::Off;
        cleared
    }

    /// Run the deadline identified by `token` at `now_ms`.
    ///
    /// Stale tokens (from a deadline that was since canceled or replaced) are ignored.
    pub fn fire(&mut self, token: TimerToken, now_ms: u64, board: &Board) -> Option<HintUpdate> {
        if !self.timer.fire(token) {
            return None;
        }

        match self.phase {
            HintPhase::Waiting => match find_matchable_pair(board) {
                Some(pair) => {
                    self.phase = HintPhase::Showing(pair);
                    self.timer.arm(now_ms.saturating_add(self.display_ms));
                    Some(HintUpdate::Shown(pair))
                }
                None => {
                    self.phase = HintPhase::Dormant;
                    None
                }
            },
            HintPhase::Showing(_) => {
                self.start(now_ms);
                Some(HintUpdate::Cleared)
            }
            HintPhase::Off | HintPhase::Dormant => None,
        }
    }
}

impl Default for HintScheduler {
    fn default() -> Self {
        Self::new(HINT_IDLE_MS as u64, HINT_DISPLAY_MS as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellId;

    fn pairable_board() -> Board {
        Board::from_values(1, 4, &[Some(2), Some(5), Some(8), Some(5)])
    }

    fn fire_due(hints: &mut HintScheduler, now_ms: u64, board: &Board) -> Option<HintUpdate> {
        let (_, token) = hints.due(now_ms)?;
        hints.fire(token, now_ms, board)
    }

    #[test]
    fn test_starts_off() {
        let hints = HintScheduler::default();
        assert_eq!(hints.phase(), HintPhase::Off);
        assert_eq!(hints.deadline(), None);
    }

    #[test]
    fn test_shows_after_idle_then_clears() {
        let board = pairable_board();
        let mut hints = HintScheduler::new(5000, 3000);
        hints.start(0);

        assert_eq!(fire_due(&mut hints, 4999, &board), None);
        let pair = HintPair {
            first: CellId(1),
            second: CellId(3),
        };
        assert_eq!(fire_due(&mut hints, 5000, &board), Some(HintUpdate::Shown(pair)));
        assert_eq!(hints.active(), Some(pair));
        assert_eq!(hints.deadline(), Some(8000));

        assert_eq!(fire_due(&mut hints, 8000, &board), Some(HintUpdate::Cleared));
        assert_eq!(hints.active(), None);
        assert_eq!(hints.last_interaction_ms(), 8000);
        assert_eq!(hints.deadline(), Some(13000));
    }

    #[test]
    fn test_interaction_cancels_visible_hint() {
        let board = pairable_board();
        let mut hints = HintScheduler::new(5000, 3000);
        hints.start(0);
        fire_due(&mut hints, 5000, &board);
        let stale = hints.due(8000).map(|(_, t)| t);

        assert!(hints.interact(6000));
        assert_eq!(hints.active(), None);
        assert_eq!(hints.deadline(), Some(11000));

        // The hide deadline that was armed before the interaction can no longer fire.
        if let Some(token) = stale {
            assert_eq!(hints.fire(token, 8000, &board), None);
        }
        assert_eq!(hints.phase(), HintPhase::Waiting);
    }

    #[test]
    fn test_no_pair_goes_dormant_until_interaction() {
        let board = Board::from_values(1, 3, &[Some(1), Some(2), Some(3)]);
        let mut hints = HintScheduler::new(5000, 3000);
        hints.start(0);

        assert_eq!(fire_due(&mut hints, 5000, &board), None);
        assert_eq!(hints.phase(), HintPhase::Dormant);
        assert_eq!(hints.deadline(), None);

        assert!(!hints.interact(7000));
        assert_eq!(hints.deadline(), Some(12000));
    }

    #[test]
    fn test_stop_and_interact_while_off() {
        let board = pairable_board();
        let mut hints = HintScheduler::new(10, 10);
        hints.start(0);
        fire_due(&mut hints, 10, &board);

        assert!(hints.stop());
        assert_eq!(hints.phase(), HintPhase::Off);
        assert_eq!(hints.deadline(), None);

        assert!(!hints.interact(50));
        assert_eq!(hints.phase(), HintPhase::Off);
    }
}
