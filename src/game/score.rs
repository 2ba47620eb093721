//! Star rating from move count.
//!
//! The best possible (and very unlikely) game takes one move per pair, so the
//! thresholds are the pair count plus some allowance for misses.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreThresholds {
    /// Three stars at or below this many moves.
    pub low: u32,
    /// Two stars at or below this many moves.
    pub high: u32,
    /// Computed alongside the other two but never consulted by [`score`].
    pub extended: u32,
}

impl ScoreThresholds {
    pub fn for_pairs(pairs: u32) -> Self {
        let allowance = pairs.div_ceil(2);
        Self {
            low: pairs + allowance,
            high: pairs * 2,
            extended: pairs + allowance * 3,
        }
    }
}

/// Score a game from 3 (best) to 1.
pub fn score(thresholds: &ScoreThresholds, moves: u32) -> u8 {
    if moves <= thresholds.low {
        3
    } else if moves <= thresholds.high {
        2
    } else {
        1
    }
}
