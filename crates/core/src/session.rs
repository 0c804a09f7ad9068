//! Game session module - owns one play-through of a level
//!
//! This module ties together the board, value generator, match evaluator and
//! hint scheduler. It handles the countdown, selection, row injection and the
//! `Playing -> Won | Lost` lifecycle.
//!
//! Time is a virtual millisecond clock advanced with [`GameSession::advance`].
//! The session owns three cancelable timer slots (countdown, win grace delay,
//! hint) and fires them in chronological order while advancing, so a driver
//! only needs to sleep until [`GameSession::next_deadline_ms`] and call
//! `advance_to` with the current time.

use crate::board::{Board, Cell};
use crate::hint::{HintScheduler, HintUpdate};
use crate::matching::{is_board_cleared, is_valid_match};
use crate::rng::ValueGenerator;
use crate::snapshot::{CellSnapshot, GameSnapshot};
use crate::timer::{TimerSlot, TimerToken};
use crate::types::*;

/// Scheduling durations, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timings {
    pub tick_ms: u32,
    pub win_delay_ms: u32,
    pub hint_idle_ms: u32,
    pub hint_display_ms: u32,
}

impl Timings {
    /// Periodic durations are at least 1ms so a deadline can never re-arm at the
    /// instant it fired.
    pub fn sanitized(self) -> Self {
        Self {
            tick_ms: self.tick_ms.max(1),
            win_delay_ms: self.win_delay_ms,
            hint_idle_ms: self.hint_idle_ms.max(1),
            hint_display_ms: self.hint_display_ms.max(1),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            win_delay_ms: WIN_DELAY_MS,
            hint_idle_ms: HINT_IDLE_MS,
            hint_display_ms: HINT_DISPLAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Countdown(TimerToken),
    WinDelay(TimerToken),
    Hint(TimerToken),
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameSession {
    timings: Timings,
    /// Level catalog in play order, never empty.
    levels: &'static [Level],
    generator: ValueGenerator,
    level_index: usize,
    board: Board,
    selected: Option<CellId>,
    time_remaining: u32,
    status: GameStatus,
    extra_rows_added: u8,
    hints: HintScheduler,
    countdown: TimerSlot,
    win_delay: TimerSlot,
    /// Virtual clock in milliseconds.
    now_ms: u64,
    /// Monotonic id of the current play-through (increments on every level start).
    episode_id: u32,
    /// Signals not yet consumed by the driver.
    events: Vec<CoreEvent>,
}

impl GameSession {
    /// Create an idle session with the given RNG seed and default timings
    pub fn new(seed: u32) -> Self {
        Self::with_timings(seed, Timings::default())
    }

    pub fn with_timings(seed: u32, timings: Timings) -> Self {
        Self::with_levels(seed, timings, &LEVELS)
    }

    /// Play a custom level catalog. An empty catalog falls back to [`LEVELS`].
    pub fn with_levels(seed: u32, timings: Timings, levels: &'static [Level]) -> Self {
        let timings = timings.sanitized();
        let levels: &'static [Level] = if levels.is_empty() { &LEVELS } else { levels };
        let level = levels[0];
        Self {
            timings,
            levels,
            generator: ValueGenerator::new(seed),
            level_index: 0,
            board: Board::empty(level.rows, level.cols),
            selected: None,
            time_remaining: level.time_limit_secs,
            status: GameStatus::Idle,
            extra_rows_added: 0,
            hints: HintScheduler::new(timings.hint_idle_ms as u64, timings.hint_display_ms as u64),
            countdown: TimerSlot::new(),
            win_delay: TimerSlot::new(),
            now_ms: 0,
            episode_id: 0,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn selected(&self) -> Option<CellId> {
        self.selected
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn extra_rows_added(&self) -> u8 {
        self.extra_rows_added
    }

    pub fn extra_rows_remaining(&self) -> u8 {
        self.level().max_extra_rows.saturating_sub(self.extra_rows_added)
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level(&self) -> Level {
        self.levels[self.level_index]
    }

    pub fn levels(&self) -> &'static [Level] {
        self.levels
    }

    pub fn hint(&self) -> Option<HintPair> {
        self.hints.active()
    }

    pub fn last_interaction_ms(&self) -> u64 {
        self.hints.last_interaction_ms()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// Board cleared, waiting for the grace delay before `Won`
    pub fn is_win_pending(&self) -> bool {
        self.win_delay.is_armed()
    }

    /// RNG state, for seeding a follow-up session
    pub fn seed(&self) -> u32 {
        self.generator.seed()
    }

    /// True while intents can change the board
    pub fn accepts_input(&self) -> bool {
        self.status == GameStatus::Playing && !self.is_win_pending()
    }

    /// Drain signals emitted since the last call
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        let hint = self.hints.active();

        out.level_index = self.level_index;
        out.level = self.level();
        out.status = self.status;
        out.rows = self.board.rows();
        out.cols = self.board.cols();
        out.cells.clear();
        out.cells.extend(self.board.cells().iter().map(|c| CellSnapshot {
            id: c.id,
            row: c.row,
            col: c.col,
            value: c.value,
            matched: c.matched,
            selected: self.selected == Some(c.id),
            hinted: hint.is_some_and(|h| h.contains(c.id)),
        }));
        out.selected = self.selected;
        out.time_remaining = self.time_remaining;
        out.extra_rows_added = self.extra_rows_added;
        out.hint = hint;
        out.win_pending = self.is_win_pending();
        out.episode_id = self.episode_id;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Earliest armed deadline on the session clock
    pub fn next_deadline_ms(&self) -> Option<u64> {
        [
            self.countdown.deadline(),
            self.win_delay.deadline(),
            self.hints.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Start the level at `index` with a fresh board.
    ///
    /// Cancels every pending timer of the previous play-through before arming
    /// the new countdown and hint wait. Out-of-range indices are ignored.
    pub fn start_level(&mut self, index: usize) -> bool {
        let Some(level) = self.levels.get(index).copied() else {
            return false;
        };

        self.cancel_timers();
        if self.hints.stop() {
            self.events.push(CoreEvent::HintCleared);
        }

        self.level_index = index;
        self.board = Board::for_level(&level, &mut self.generator);
        self.selected = None;
        self.time_remaining = level.time_limit_secs;
        self.extra_rows_added = 0;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.set_status(GameStatus::Playing);

        self.countdown
            .arm(self.now_ms.saturating_add(self.timings.tick_ms as u64));
        self.hints.start(self.now_ms);
        true
    }

    /// Start the current level again
    pub fn restart(&mut self) -> bool {
        self.start_level(self.level_index)
    }

    /// Start the next level, or go back to the menu after the last one.
    ///
    /// Returns true if a new level was started.
    pub fn advance_level(&mut self) -> bool {
        let next = self.level_index + 1;
        if next < self.levels.len() {
            self.start_level(next)
        } else {
            self.go_to_menu();
            false
        }
    }

    /// Leave the game: status becomes `Idle` and every timer is canceled.
    pub fn go_to_menu(&mut self) {
        self.cancel_timers();
        if self.hints.stop() {
            self.events.push(CoreEvent::HintCleared);
        }
        self.selected = None;
        self.set_status(GameStatus::Idle);
    }

    /// One second of countdown.
    ///
    /// Reaching zero ends the session as `Lost`. No-op unless playing, and while
    /// a win is pending the clock is frozen.
    pub fn tick(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.finish(GameStatus::Lost);
        }
        true
    }

    /// Tap a cell. Returns false when the tap was ignored.
    pub fn select_cell(&mut self, id: CellId) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(cell) = self.board.cell(id).copied().filter(Cell::is_eligible) else {
            return false;
        };

        self.touch();

        let Some(current) = self.selected else {
            self.selected = Some(id);
            return true;
        };

        if current == id {
            self.selected = None;
            return true;
        }

        // The earlier selection may have gone stale (e.g. matched); treat it as a reselect.
        let Some(first) = self.board.cell(current).copied().filter(Cell::is_eligible) else {
            self.selected = Some(id);
            return true;
        };

        self.selected = None;
        let valid = match (first.value, cell.value) {
            (Some(a), Some(b)) => is_valid_match(a, b),
            _ => false,
        };

        if valid {
            self.board.mark_matched(first.id);
            self.board.mark_matched(cell.id);
            self.events.push(CoreEvent::MatchSuccess {
                first: first.id,
                second: cell.id,
            });
            if is_board_cleared(&self.board) {
                self.on_board_cleared();
            }
        } else {
            self.events.push(CoreEvent::MatchFailure {
                first: first.id,
                second: cell.id,
            });
        }
        true
    }

    /// Fill the next extra row with fresh values.
    ///
    /// Ignored when not playing, when the level's allowance is used up, or when the
    /// next row would fall outside the grid.
    pub fn add_row(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }

        let level = self.level();
        if self.extra_rows_added >= level.max_extra_rows {
            return false;
        }
        let row = level.initial_filled_rows.saturating_add(self.extra_rows_added);
        if row >= level.rows {
            return false;
        }

        let values = self.generator.generate(level.cols as usize);
        if !self.board.fill_row(row, &values) {
            return false;
        }

        self.extra_rows_added += 1;
        self.touch();
        self.events.push(CoreEvent::RowAdded { row });
        true
    }

    /// Apply an inbound intent
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::StartLevel(index) => self.start_level(index),
            GameAction::SelectCell(id) => self.select_cell(id),
            GameAction::AddRow => self.add_row(),
            GameAction::Restart => self.restart(),
            GameAction::AdvanceLevel => self.advance_level(),
            GameAction::GoToMenu => {
                self.go_to_menu();
                true
            }
        }
    }

    /// Advance the session clock by `elapsed_ms`, firing due timers in order.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let target = self.now_ms.saturating_add(elapsed_ms);

        while let Some((due_ms, task)) = self.next_due(target) {
            self.now_ms = self.now_ms.max(due_ms);
            self.run_task(task);
        }

        self.now_ms = target;
    }

    /// Advance the session clock to `now_ms` (never backwards).
    pub fn advance_to(&mut self, now_ms: u64) {
        self.advance(now_ms.saturating_sub(self.now_ms));
    }

    fn next_due(&self, limit_ms: u64) -> Option<(u64, Task)> {
        // Ties resolve in this order.
        let candidates = [
            self.countdown.due(limit_ms).map(|(d, t)| (d, Task::Countdown(t))),
            self.win_delay.due(limit_ms).map(|(d, t)| (d, Task::WinDelay(t))),
            self.hints.due(limit_ms).map(|(d, t)| (d, Task::Hint(t))),
        ];

        let mut best: Option<(u64, Task)> = None;
        for candidate in candidates.into_iter().flatten() {
            match best {
                Some((due, _)) if due <= candidate.0 => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Countdown(token) => {
                if !self.countdown.fire(token) {
                    return;
                }
                self.tick();
                if self.accepts_input() {
                    self.countdown
                        .arm(self.now_ms.saturating_add(self.timings.tick_ms as u64));
                }
            }
            Task::WinDelay(token) => {
                if self.win_delay.fire(token) && self.status == GameStatus::Playing {
                    self.finish(GameStatus::Won);
                }
            }
            Task::Hint(token) => {
                if self.status != GameStatus::Playing {
                    return;
                }
                match self.hints.fire(token, self.now_ms, &self.board) {
                    Some(HintUpdate::Shown(pair)) => self.events.push(CoreEvent::HintShown(pair)),
                    Some(HintUpdate::Cleared) => self.events.push(CoreEvent::HintCleared),
                    None => {}
                }
            }
        }
    }

    /// Player interaction: resets the idle baseline and drops any visible hint.
    fn touch(&mut self) {
        if self.hints.interact(self.now_ms) {
            self.events.push(CoreEvent::HintCleared);
        }
    }

    fn on_board_cleared(&mut self) {
        self.events.push(CoreEvent::BoardCleared);
        self.countdown.cancel();
        if self.hints.stop() {
            self.events.push(CoreEvent::HintCleared);
        }
        self.win_delay
            .arm(self.now_ms.saturating_add(self.timings.win_delay_ms as u64));
    }

    fn finish(&mut self, status: GameStatus) {
        self.cancel_timers();
        if self.hints.stop() {
            self.events.push(CoreEvent::HintCleared);
        }
        self.selected = None;
        self.set_status(status);
    }

    fn cancel_timers(&mut self) {
        self.countdown.cancel();
        self.win_delay.cancel();
    }

    fn set_status(&mut self, status: GameStatus) {
        if self.status != status {
            self.status = status;
            self.events.push(CoreEvent::StatusChanged(status));
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(1)
    }
}
