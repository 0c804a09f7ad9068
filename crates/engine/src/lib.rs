//! Async engine for number-match.
//!
//! Owns a [`GameSession`](number_match_core::GameSession) inside a tokio task and
//! maps wall-clock time onto the session's virtual clock.
//!
//! ```no_run
//! use number_match_engine::{Engine, EngineConfig};
//! use number_match_types::GameAction;
//!
//! # async fn demo() -> Result<(), number_match_engine::EngineError> {
//! let engine = Engine::spawn(EngineConfig::with_seed(7));
//! let handle = engine.handle();
//! handle.apply(GameAction::StartLevel(0)).await?;
//! println!("{}", handle.snapshot().time_display());
//! engine.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod runtime;

pub use config::{ConfigError, EngineConfig};
pub use runtime::{Engine, EngineError, EngineHandle};
