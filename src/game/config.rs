//! Session configuration.
//!
//! Loaded from JSON posted by the page (`/api/memory/config`). Every field is
//! optional; missing ones fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::card::SYMBOLS;

pub const DEFAULT_MISMATCH_DELAY_MS: u64 = 1_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
/// Upper bound for both delays.
pub const MAX_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pairs must be between 1 and {max}, got {got}")]
    Pairs { got: usize, max: usize },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("{field} must be at most {max} ms, got {got}")]
    IntervalTooLong {
        field: &'static str,
        got: u64,
        max: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of symbol pairs dealt, taken from the front of the fixed set.
    pub pairs: usize,
    /// How long a mismatched pair stays visible before closing.
    pub mismatch_delay_ms: u64,
    /// Period of the elapsed-time ticker.
    pub tick_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pairs: SYMBOLS.len(),
            mismatch_delay_ms: DEFAULT_MISMATCH_DELAY_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl GameConfig {
    pub fn with_pairs(pairs: usize) -> Result<Self, ConfigError> {
        let config = Self {
            pairs,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs == 0 || self.pairs > SYMBOLS.len() {
            return Err(ConfigError::Pairs {
                got: self.pairs,
                max: SYMBOLS.len(),
            });
        }
        check_interval("mismatch_delay_ms", self.mismatch_delay_ms)?;
        check_interval("tick_interval_ms", self.tick_interval_ms)
    }
}

fn check_interval(field: &'static str, ms: u64) -> Result<(), ConfigError> {
    match ms {
        0 => Err(ConfigError::ZeroInterval(field)),
        got if got > MAX_INTERVAL_MS => Err(ConfigError::IntervalTooLong {
            field,
            got,
            max: MAX_INTERVAL_MS,
        }),
        _ => Ok(()),
    }
}
