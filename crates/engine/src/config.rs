//! Engine configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `NUMBER_MATCH_SEED` | derived from the wall clock |
//! | `NUMBER_MATCH_WIN_DELAY_MS` | 500 |
//! | `NUMBER_MATCH_HINT_IDLE_MS` | 5000 |
//! | `NUMBER_MATCH_HINT_DISPLAY_MS` | 3000 |
//! | `NUMBER_MATCH_MAX_PENDING` | 16 |
//!
//! Unset or blank variables fall back to the default. A value that is set but
//! does not parse is an error rather than a silent fallback.

use std::str::FromStr;

use number_match_core::Timings;

pub const SEED_VAR: &str = "NUMBER_MATCH_SEED";
pub const WIN_DELAY_VAR: &str = "NUMBER_MATCH_WIN_DELAY_MS";
pub const HINT_IDLE_VAR: &str = "NUMBER_MATCH_HINT_IDLE_MS";
pub const HINT_DISPLAY_VAR: &str = "NUMBER_MATCH_HINT_DISPLAY_MS";
pub const MAX_PENDING_VAR: &str = "NUMBER_MATCH_MAX_PENDING";

pub const DEFAULT_MAX_PENDING: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{var} must be at least {min}")]
    TooSmall { var: &'static str, min: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub seed: u32,
    pub timings: Timings,
    /// Capacity of the intent queue
    pub max_pending: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: clock_seed(),
            timings: Timings::default(),
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl EngineConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Timings::default();

        let seed = parse_var(&lookup, SEED_VAR, "u32")?.unwrap_or_else(clock_seed);
        let timings = Timings {
            tick_ms: defaults.tick_ms,
            win_delay_ms: parse_var(&lookup, WIN_DELAY_VAR, "millisecond count")?
                .unwrap_or(defaults.win_delay_ms),
            hint_idle_ms: parse_var(&lookup, HINT_IDLE_VAR, "millisecond count")?
                .unwrap_or(defaults.hint_idle_ms),
            hint_display_ms: parse_var(&lookup, HINT_DISPLAY_VAR, "millisecond count")?
                .unwrap_or(defaults.hint_display_ms),
        };

        for (var, value) in [
            (HINT_IDLE_VAR, timings.hint_idle_ms),
            (HINT_DISPLAY_VAR, timings.hint_display_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::TooSmall { var, min: 1 });
            }
        }

        let max_pending: usize =
            parse_var(&lookup, MAX_PENDING_VAR, "queue size")?.unwrap_or(DEFAULT_MAX_PENDING);
        if max_pending == 0 {
            return Err(ConfigError::TooSmall {
                var: MAX_PENDING_VAR,
                min: 1,
            });
        }

        Ok(Self {
            seed,
            timings,
            max_pending,
        })
    }
}

/// Read and parse one variable. Unset or blank is `Ok(None)`.
pub fn parse_var<T, F>(lookup: &F, var: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|_| ConfigError::Invalid {
        var,
        value: raw.clone(),
        expected,
    })
}

/// Seed from the sub-second part of the wall clock
pub fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() as u32) ^ now.subsec_nanos()
}
