//! MCTS search driver.
//!
//! Builds the node pool, expands the root, runs one worker per configured
//! thread over the shared tree and reads the decision off the root edges.
//! Worker 0 runs on the calling thread; the rest run in a thread scope that
//! ends before the result is read.

use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::debug;

use crate::core::{GameRng, Move};
use crate::rules::Board;
use crate::search::Limits;

use super::config::MctsConfig;
use super::node::MctsNode;
use super::policy::{SelectionPolicy, SimulationPolicy, UniformPlayout, Uct};
use super::stats::{SearchStats, StopReason};
use super::tree::SearchTree;
use super::worker::{Shared, Worker};

/// Outcome of one MCTS decision.
#[derive(Clone, Debug)]
pub struct MctsResult {
    /// Most visited root move, or a proven win.
    pub mv: Move,

    /// Visits of the chosen move.
    pub visits: u32,

    /// Mean reward of the chosen move for the player to move.
    pub mean_reward: f64,

    pub proven_win: bool,

    /// Every root move with its visit count, in move-list order.
    pub root_visits: Vec<(Move, u32)>,

    pub stats: SearchStats,
}

/// Main MCTS search context.
///
/// Generic over the board type. Owns the configuration and policies; the
/// tree is built fresh for every decision.
pub struct MctsSearch<B: Board> {
    config: MctsConfig,
    selection: Box<dyn SelectionPolicy>,
    simulation: Box<dyn SimulationPolicy<B>>,
}

impl<B: Board> MctsSearch<B> {
    pub fn new(config: MctsConfig) -> Self {
        Self {
            config,
            selection: Box::new(Uct),
            simulation: Box::new(UniformPlayout),
        }
    }

    /// Set a custom selection policy.
    #[must_use]
    pub fn with_selection<S: SelectionPolicy + 'static>(mut self, selection: S) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Set a custom simulation policy.
    #[must_use]
    pub fn with_simulation<S: SimulationPolicy<B> + 'static>(mut self, simulation: S) -> Self {
        self.simulation = Box::new(simulation);
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Search with an RNG seeded from the config.
    pub fn search(&self, board: B, limits: &Limits) -> MctsResult {
        self.search_with_rng(board, limits, &GameRng::new(self.config.seed))
    }

    /// Search with worker `i` drawing from `rng.stream(i)`.
    pub fn search_with_rng(&self, board: B, limits: &Limits, rng: &GameRng) -> MctsResult {
        self.search_with_tree(board, limits, rng).0
    }

    /// Search and hand back the finished tree for inspection.
    ///
    /// # Panics
    ///
    /// If `board` has no legal moves.
    pub fn search_with_tree(&self, board: B, limits: &Limits, rng: &GameRng) -> (MctsResult, SearchTree) {
        let start = Instant::now();
        let vocabulary = board.vocabulary();
        let player_count = board.player_count();

        let moves = board.legal_moves();
        assert!(!moves.is_empty(), "mcts root has no legal moves");
        let mut root = MctsNode::root(board.current_player());
        root.set_edges(moves, player_count);
        let single = root.edges.len() == 1;

        let tree = SearchTree::new(root, self.config.max_nodes, player_count);
        let threads = self.config.threads.max(1);
        let shared = Shared::new(&self.config, &tree, limits, &*self.selection, &*self.simulation);

        if single {
            shared.finish(StopReason::SingleChild);
        } else {
            let mut boards = Vec::with_capacity(threads);
            for _ in 1..threads {
                boards.push(board.clone());
            }
            boards.insert(0, board);
            let mut workers: Vec<Worker<'_, B>> = boards
                .into_iter()
                .enumerate()
                .map(|(i, b)| Worker::new(i, &shared, b, rng.stream(i)))
                .collect();
            let lead = workers.remove(0);

            std::thread::scope(|s| {
                for worker in workers {
                    s.spawn(move || worker.run());
                }
                lead.run();
            });
        }

        let stats = SearchStats {
            iterations: shared.iterations.load(Ordering::Acquire),
            nodes: tree.len(),
            playout_moves: shared.playout_moves.load(Ordering::Acquire),
            terminal_hits: shared.terminal_hits.load(Ordering::Acquire),
            killed: shared.killed.load(Ordering::Acquire),
            max_depth: shared.max_depth.load(Ordering::Acquire),
            threads,
            time_us: start.elapsed().as_micros() as u64,
            stop: shared.reason(),
        };
        drop(shared);

        let result = {
            let root = tree.lock(tree.root());
            let best = root.best_edge().unwrap_or(0);
            let edge = &root.edges[best];
            MctsResult {
                mv: edge.mv.clone(),
                visits: edge.visits,
                mean_reward: edge.mean_reward(root.to_move),
                proven_win: edge.proven_win,
                root_visits: root.edges.iter().map(|e| (e.mv.clone(), e.visits)).collect(),
                stats,
            }
        };

        debug!(
            mv = %result.mv.describe(vocabulary),
            visits = result.visits,
            iterations = result.stats.iterations,
            nodes = result.stats.nodes,
            per_second = result.stats.iterations_per_second(),
            stop = ?result.stats.stop,
            "MCTS search finished"
        );
        (result, tree)
    }
}
