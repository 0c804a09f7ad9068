//! Number-match (workspace facade crate).
//!
//! Re-exports the member crates under `number_match::{core,engine,adapter,types}`
//! while the implementation lives in dedicated crates under `crates/`.

pub use number_match_adapter as adapter;
pub use number_match_core as core;
pub use number_match_engine as engine;
pub use number_match_types as types;
