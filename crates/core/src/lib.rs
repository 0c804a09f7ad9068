//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the puzzle rules, state management, and scheduling.
//! It has **zero dependencies** on rendering, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed and same clock advances produce identical sessions
//! - **Testable**: Timers run on a virtual clock, so tests never sleep
//! - **Portable**: Can be driven by an async runtime, a test, or a frame loop
//!
//! # Module Structure
//!
//! - [`rng`]: Seeded LCG and the biased value generator
//! - [`board`]: Row-major grid of cells with stable ids
//! - [`matching`]: Pair validity, board completion and first-pair search
//! - [`timer`]: Cancelable deadline slots with stale-token protection
//! - [`hint`]: Idle-triggered hint scheduler
//! - [`session`]: The `Idle | Playing | Won | Lost` state machine
//! - [`snapshot`]: Read-only state handed to renderers
//!
//! # Game Rules
//!
//! - Tap two cells: equal values or values that sum to ten are cleared
//! - "Add row" fills the next empty row, a limited number of times per level
//! - Clear every filled cell before the countdown runs out to win
//! - After 5 seconds without input a matchable pair is highlighted for 3 seconds
//!
//! # Example
//!
//! ```
//! use number_match_core::GameSession;
//! use number_match_types::{GameAction, GameStatus};
//!
//! let mut session = GameSession::new(12345);
//! session.apply_action(GameAction::StartLevel(0));
//! assert_eq!(session.status(), GameStatus::Playing);
//!
//! // One second of play.
//! session.advance(1000);
//! assert_eq!(session.time_remaining(), 119);
//!
//! session.apply_action(GameAction::AddRow);
//! assert_eq!(session.extra_rows_added(), 1);
//! ```
//!
//! # Timing
//!
//! Call [`GameSession::advance`](session::GameSession::advance) with elapsed
//! milliseconds, or sleep until
//! [`GameSession::next_deadline_ms`](session::GameSession::next_deadline_ms)
//! and call `advance_to`.

pub mod board;
pub mod hint;
pub mod matching;
pub mod rng;
pub mod session;
pub mod snapshot;
pub mod timer;

pub use number_match_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, Cell};
pub use hint::{HintPhase, HintScheduler, HintUpdate};
pub use matching::{find_matchable_pair, is_board_cleared, is_valid_match};
pub use rng::{SimpleRng, ValueGenerator};
pub use session::{GameSession, Timings};
pub use snapshot::{CellSnapshot, GameSnapshot};
pub use timer::{TimerSlot, TimerToken};
