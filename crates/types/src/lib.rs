//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, async driver, renderer protocol).
//!
//! # Level Catalog
//!
//! | Index | Name | Grid | Initial rows | Extra rows | Time limit |
//! |-------|------|------|--------------|------------|------------|
//! | 0 | Easy | 5x4 | 2 | 2 | 120s |
//! | 1 | Medium | 7x6 | 3 | 3 | 120s |
//! | 2 | Hard | 8x6 | 4 | 3 | 120s |
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 1000 | Countdown period |
//! | `WIN_DELAY_MS` | 500 | Grace delay between board cleared and `Won` |
//! | `HINT_IDLE_MS` | 5000 | Inactivity before a hint is surfaced |
//! | `HINT_DISPLAY_MS` | 3000 | How long a hint stays visible |
//!
//! # Examples
//!
//! ```
//! use number_match_types::{format_time, GameStatus, LEVELS};
//!
//! let easy = LEVELS[0];
//! assert_eq!((easy.rows, easy.cols), (5, 4));
//! assert_eq!(easy.initial_cells(), 8);
//!
//! assert_eq!(format_time(easy.time_limit_secs), "02:00");
//! assert!(!GameStatus::Idle.is_finished());
//! ```

/// Countdown period in milliseconds (one second per tick)
pub const TICK_MS: u32 = 1000;

/// Grace delay between clearing the board and the `Won` transition
pub const WIN_DELAY_MS: u32 = 500;

/// Inactivity period before a hint is surfaced
pub const HINT_IDLE_MS: u32 = 5000;

/// How long a surfaced hint stays visible
pub const HINT_DISPLAY_MS: u32 = 3000;

/// Smallest value a filled cell can hold
pub const MIN_VALUE: u8 = 1;

/// Largest value a filled cell can hold
pub const MAX_VALUE: u8 = 9;

/// Two values match when they are equal or add up to this
pub const MATCH_SUM: u8 = 10;


/// Stable identifier of a board position.
///
/// Ids are assigned row-major starting at 1 and never change for the lifetime
/// of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value held by a cell
///
/// - `None`: empty placeholder (never matchable)
/// - `Some(1..=9)`: a digit
pub type CellValue = Option<u8>;

/// Static level configuration, selected by index at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level {
    pub id: u8,
    pub rows: u8,
    pub cols: u8,
    pub initial_filled_rows: u8,
    pub max_extra_rows: u8,
    pub time_limit_secs: u32,
    pub name: &'static str,
}

impl Level {
    /// Number of positions on the grid
    pub fn total_cells(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Number of positions filled when the board is created
    pub fn initial_cells(&self) -> usize {
        (self.initial_filled_rows as usize * self.cols as usize).min(self.total_cells())
    }
}

/// The level catalog, in play order.
pub const LEVELS: [Level; 3] = [
    Level {
        id: 1,
        rows: 5,
        cols: 4,
        initial_filled_rows: 2,
        max_extra_rows: 2,
        time_limit_secs: 120,
        name: "Easy",
    },
    Level {
        id: 2,
        rows: 7,
        cols: 6,
        initial_filled_rows: 3,
        max_extra_rows: 3,
        time_limit_secs: 120,
        name: "Medium",
    },
    Level {
        id: 3,
        rows: 8,
        cols: 6,
        initial_filled_rows: 4,
        max_extra_rows: 3,
        time_limit_secs: 120,
        name: "Hard",
    },
];

/// Session status
///
/// `Idle` is the "not started / back at the menu" sentinel. A session moves
/// `Playing -> Won` or `Playing -> Lost`; finished sessions are never resumed,
/// a new one is started instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Idle,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    /// Parse status from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "idle" => Some(GameStatus::Idle),
            "playing" => Some(GameStatus::Playing),
            "won" => Some(GameStatus::Won),
            "lost" => Some(GameStatus::Lost),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Idle => "idle",
            GameStatus::Playing => "playing",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
        }
    }

    /// True for `Won` and `Lost`
    pub fn is_finished(&self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// Two cells surfaced together as a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HintPair {
    pub first: CellId,
    pub second: CellId,
}

impl HintPair {
    pub fn contains(&self, id: CellId) -> bool {
        self.first == id || self.second == id
    }
}

/// Intents emitted by the presentation layer
///
/// These are used by both local drivers and the JSON adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Start the level at the given catalog index
    StartLevel(usize),
    /// Tap a cell
    SelectCell(CellId),
    /// Inject the next extra row
    AddRow,
    /// Restart the current level with a fresh board
    Restart,
    /// Move on to the next level (or back to the menu after the last one)
    AdvanceLevel,
    /// Leave the game screen
    GoToMenu,
}

impl GameAction {
    /// Convert to camelCase string for the renderer protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::StartLevel(_) => "startLevel",
            GameAction::SelectCell(_) => "selectCell",
            GameAction::AddRow => "addRow",
            GameAction::Restart => "restart",
            GameAction::AdvanceLevel => "advanceLevel",
            GameAction::GoToMenu => "goToMenu",
        }
    }
}

/// Transient signals for renderer feedback effects.
///
/// Engine-internal; mapped to the adapter protocol `event` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    MatchSuccess { first: CellId, second: CellId },
    MatchFailure { first: CellId, second: CellId },
    BoardCleared,
    RowAdded { row: u8 },
    HintShown(HintPair),
    HintCleared,
    StatusChanged(GameStatus),
}

impl CoreEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreEvent::MatchSuccess { .. } => "matchSuccess",
            CoreEvent::MatchFailure { .. } => "matchFailure",
            CoreEvent::BoardCleared => "boardCleared",
            CoreEvent::RowAdded { .. } => "rowAdded",
            CoreEvent::HintShown(_) => "hintShown",
            CoreEvent::HintCleared => "hintCleared",
            CoreEvent::StatusChanged(_) => "statusChanged",
        }
    }
}

/// Format seconds as `MM:SS`
///
/// Minutes are `seconds / 60` zero-padded to two digits (more digits are kept
/// when needed), seconds are `seconds % 60` zero-padded to two digits.
///
/// # Examples
///
/// ```
/// use number_match_types::format_time;
///
/// assert_eq!(format_time(75), "01:15");
/// ```
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
