//! Multi-threaded Monte Carlo Tree Search (UCT).
//!
//! ## Overview
//!
//! - **Shared tree**: one preallocated node pool per decision, one lock per
//!   node, workers on scoped threads with private board clones
//! - **Virtual loss**: traversals in flight count against an edge so
//!   concurrent workers spread out
//! - **Hopeless-move pruning**: root moves that cannot catch up within the
//!   remaining budget are killed, and the search stops once the best move
//!   cannot be overtaken
//! - **Configurable policies**: selection (UCT) and playout (uniform,
//!   weighted)
//!
//! ## Usage
//!
//! ```rust
//! use rust_boardgame::games::connect::ConnectBoard;
//! use rust_boardgame::mcts::{MctsConfig, MctsSearch};
//! use rust_boardgame::search::{Budget, CancelToken};
//!
//! let search = MctsSearch::new(MctsConfig::default().with_threads(2));
//! let limits = Budget::nodes(2_000).start(&CancelToken::new());
//! let result = search.search(ConnectBoard::new(5), &limits);
//! println!("best move visited {} times", result.visits);
//! ```

pub mod config;
pub mod node;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;
mod worker;

// Re-export main types
pub use config::{KillMode, MctsConfig};
pub use node::{Edge, MctsNode, NodeId, NodeState};
pub use policy::{
    board_rewards, draw_rewards, result_to_rewards, select_edge, SelectionPolicy, SimulationPolicy,
    UniformPlayout, Uct, WeightedPlayout,
};
pub use search::{MctsResult, MctsSearch};
pub use stats::{SearchStats, StopReason};
pub use tree::{SearchTree, TreeStats};
