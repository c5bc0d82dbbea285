//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};

/// How the periodic pass decides a root edge can no longer catch up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillMode {
    Off,
    /// Compare visit counts plus a fair share of the remaining playouts.
    Visits,
    /// Compare the straight wins needed to reach the best win rate.
    WinRate,
}

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// UCT exploration weight `alpha` in `mean + alpha * sqrt(ln N / (n + 1))`.
    pub exploration: f64,

    /// Seed used when no decision RNG is supplied.
    pub seed: u64,

    /// Worker threads (1 = search on the calling thread only).
    pub threads: usize,

    /// Node pool size, allocated once per search.
    pub max_nodes: usize,

    /// Nodes shallower than this expand on their first visit.
    pub guaranteed_tree_depth: u16,

    /// Visits before a deeper leaf expands.
    pub expansion_visits: u32,

    /// When positive, a leaf expands once its visits exceed
    /// `rate * ln(parent visits)` instead of using `expansion_visits`.
    pub node_expansion_rate: f64,

    /// Pick a random unvisited edge to grow instead of the first.
    pub randomize_new_children: bool,

    /// Playout length cap; a cut-off playout scores as a draw.
    pub playout_move_limit: u32,

    pub kill_mode: KillMode,

    /// Exponent on the active-edge count when sharing out the remaining
    /// playouts. Lower values kill less.
    pub kill_share: f64,

    /// Worker 0 runs the kill and early-exit checks every this many
    /// iterations.
    pub kill_interval: u32,

    /// Stop when the node pool is full rather than continue with playouts
    /// from existing leaves.
    pub stop_on_pool_exhausted: bool,

    /// Stop after this many consecutive iterations that only re-scored known
    /// terminal positions.
    pub stall_limit: u32,

    /// Stop once the best root edge cannot be overtaken in the remaining
    /// budget.
    pub early_exit: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: 0.5,
            seed: 42,
            threads: 1,
            max_nodes: 100_000,
            guaranteed_tree_depth: 3,
            expansion_visits: 3,
            node_expansion_rate: 0.0,
            randomize_new_children: true,
            playout_move_limit: 1_000,
            kill_mode: KillMode::Visits,
            kill_share: 0.5,
            kill_interval: 64,
            stop_on_pool_exhausted: false,
            stall_limit: 1_000,
            early_exit: true,
        }
    }
}

impl MctsConfig {
    #[must_use]
    pub fn with_exploration(mut self, alpha: f64) -> Self {
        self.exploration = alpha;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes.max(1);
        self
    }

    #[must_use]
    pub fn with_expansion(mut self, guaranteed_depth: u16, visits: u32) -> Self {
        self.guaranteed_tree_depth = guaranteed_depth;
        self.expansion_visits = visits.max(1);
        self
    }

    #[must_use]
    pub fn with_node_expansion_rate(mut self, rate: f64) -> Self {
        self.node_expansion_rate = rate.max(0.0);
        self
    }

    #[must_use]
    pub fn with_playout_move_limit(mut self, limit: u32) -> Self {
        self.playout_move_limit = limit;
        self
    }

    #[must_use]
    pub fn with_kill(mut self, mode: KillMode, share: f64) -> Self {
        self.kill_mode = mode;
        self.kill_share = share;
        self
    }

    #[must_use]
    pub fn with_early_exit(mut self, on: bool) -> Self {
        self.early_exit = on;
        self
    }

    #[must_use]
    pub fn with_stop_on_pool_exhausted(mut self, on: bool) -> Self {
        self.stop_on_pool_exhausted = on;
        self
    }
}
