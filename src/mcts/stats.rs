//! MCTS search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Why a search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Playout budget used up.
    Budget,
    Deadline,
    Cancelled,
    /// The node pool filled up with `stop_on_pool_exhausted` set.
    PoolExhausted,
    /// A root move wins outright.
    ProvenWin,
    /// Only one root move is still live.
    SingleChild,
    /// Iterations kept ending on already-scored terminal positions.
    Stalled,
    /// The best root move can no longer be overtaken.
    Dominance,
}

/// Statistics collected during MCTS search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Iterations (descents with a playout or terminal score).
    pub iterations: u64,

    /// Nodes allocated, root included.
    pub nodes: usize,

    /// Moves made inside playouts.
    pub playout_moves: u64,

    /// Iterations that ended on a known terminal node.
    pub terminal_hits: u64,

    /// Root edges killed as hopeless.
    pub killed: u32,

    /// Deepest node allocated.
    pub max_depth: u16,

    pub threads: usize,

    /// Wall time (microseconds).
    pub time_us: u64,

    pub stop: Option<StopReason>,
}

impl SearchStats {
    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.iterations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    #[must_use]
    pub fn playout_moves_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.playout_moves as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Average playout length.
    #[must_use]
    pub fn avg_playout_length(&self) -> f64 {
        let playouts = self.iterations.saturating_sub(self.terminal_hits);
        if playouts == 0 {
            0.0
        } else {
            self.playout_moves as f64 / playouts as f64
        }
    }
}
