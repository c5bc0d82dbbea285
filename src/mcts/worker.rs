//! One search thread: descent, expansion, playout and backpropagation.
//!
//! Every worker owns a private board clone positioned at the root. A
//! descent executes the selected moves on it, a playout continues from the
//! leaf, and both are unexecuted before the next iteration so the clone is
//! back at the root position.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::core::{GameRng, Move, PlayerId, PlayerMap};
use crate::rules::{Board, ExecuteMode};
use crate::search::Limits;

use super::config::{KillMode, MctsConfig};
use super::node::{MctsNode, NodeId, NodeState};
use super::policy::{board_rewards, draw_rewards, select_edge, SelectionPolicy, SimulationPolicy};
use super::stats::StopReason;
use super::tree::SearchTree;

/// Budget fraction after which hopeless root edges may be killed.
const KILL_AFTER: f64 = 0.1;

/// State shared by all workers of one search.
pub(crate) struct Shared<'a, B: Board> {
    pub config: &'a MctsConfig,
    pub tree: &'a SearchTree,
    pub limits: &'a Limits,
    pub selection: &'a dyn SelectionPolicy,
    pub simulation: &'a dyn SimulationPolicy<B>,
    pub iterations: AtomicU64,
    pub playout_moves: AtomicU64,
    pub terminal_hits: AtomicU64,
    pub killed: AtomicU32,
    pub max_depth: AtomicU16,
    stopped: AtomicBool,
    reason: Mutex<Option<StopReason>>,
}

impl<'a, B: Board> Shared<'a, B> {
    pub fn new(
        config: &'a MctsConfig,
        tree: &'a SearchTree,
        limits: &'a Limits,
        selection: &'a dyn SelectionPolicy,
        simulation: &'a dyn SimulationPolicy<B>,
    ) -> Self {
        Self {
            config,
            tree,
            limits,
            selection,
            simulation,
            iterations: AtomicU64::new(0),
            playout_moves: AtomicU64::new(0),
            terminal_hits: AtomicU64::new(0),
            killed: AtomicU32::new(0),
            max_depth: AtomicU16::new(0),
            stopped: AtomicBool::new(false),
            reason: Mutex::new(None),
        }
    }

    /// Stop every worker. The first reason given is kept.
    pub fn finish(&self, reason: StopReason) {
        let mut slot = self.reason.lock();
        if slot.is_none() {
            *slot = Some(reason);
        }
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.reason.lock()
    }

    /// Claim the next iteration against the playout budget.
    fn reserve_iteration(&self) -> bool {
        match self.limits.node_limit() {
            Some(limit) => self
                .iterations
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1))
                .is_ok(),
            None => {
                self.iterations.fetch_add(1, Ordering::AcqRel);
                true
            }
        }
    }
}

pub(crate) struct Worker<'a, B: Board> {
    index: usize,
    shared: &'a Shared<'a, B>,
    board: B,
    rng: GameRng,
    /// (node, edge) pairs traversed this iteration.
    path: Vec<(NodeId, usize)>,
    /// Moves executed during the descent.
    descent: Vec<Move>,
    /// Moves executed during the playout.
    playout: Vec<Move>,
    stall: u32,
    since_maintenance: u32,
}

impl<'a, B: Board> Worker<'a, B> {
    pub fn new(index: usize, shared: &'a Shared<'a, B>, board: B, rng: GameRng) -> Self {
        Self {
            index,
            shared,
            board,
            rng,
            path: Vec::with_capacity(32),
            descent: Vec::with_capacity(32),
            playout: Vec::with_capacity(128),
            stall: 0,
            since_maintenance: 0,
        }
    }

    pub fn run(mut self) {
        let shared = self.shared;
        while !shared.is_stopped() {
            if let Some(reason) = self.stop_reason() {
                shared.finish(reason);
                break;
            }
            if !shared.reserve_iteration() {
                shared.finish(StopReason::Budget);
                break;
            }

            self.iterate();

            if self.index == 0 {
                self.since_maintenance += 1;
                if self.since_maintenance >= shared.config.kill_interval.max(1) {
                    self.since_maintenance = 0;
                    self.maintain();
                }
            }
        }
    }

    fn stop_reason(&self) -> Option<StopReason> {
        let shared = self.shared;
        if shared.limits.is_cancelled() {
            Some(StopReason::Cancelled)
        } else if shared.limits.past_deadline() {
            Some(StopReason::Deadline)
        } else if (shared.config.stop_on_pool_exhausted || shared.limits.is_unbounded())
            && shared.tree.is_exhausted()
        {
            Some(StopReason::PoolExhausted)
        } else if self.stall >= shared.config.stall_limit.max(1) {
            Some(StopReason::Stalled)
        } else {
            None
        }
    }

    /// One select / expand / simulate / backpropagate pass.
    fn iterate(&mut self) {
        let shared = self.shared;
        let tree = shared.tree;
        let config = shared.config;

        let mut node_id = tree.root();
        let mut parent_visits = 0;
        let mut created = false;

        let (leaf, rewards) = loop {
            let mut node = tree.lock(node_id);
            if let Some(rewards) = &node.terminal {
                let rewards = rewards.clone();
                drop(node);
                if created {
                    self.stall = 0;
                } else {
                    self.stall += 1;
                    shared.terminal_hits.fetch_add(1, Ordering::Relaxed);
                }
                break (Some(node_id), rewards);
            }

            let state = node.state;
            match state {
                NodeState::Unexpanded if !created && should_expand(config, &node, parent_visits) => {
                    node.state = NodeState::Expanding;
                    drop(node);
                    let moves = self.board.legal_moves();
                    let mut node = tree.lock(node_id);
                    if moves.is_empty() {
                        // Stuck without the game being over.
                        node.terminal = Some(board_rewards(&self.board));
                    }
                    node.set_edges(moves, tree.player_count());
                    continue;
                }
                NodeState::Unexpanded | NodeState::Expanding => {
                    drop(node);
                    break (Some(node_id), self.playout());
                }
                NodeState::Expanded | NodeState::FullyExplored => {}
            }

            let Some(edge_idx) = select_edge(&node, shared.selection, config, &mut self.rng) else {
                drop(node);
                break (Some(node_id), self.playout());
            };
            let edge = &mut node.edges[edge_idx];
            edge.in_flight += 1;
            let mv = edge.mv.clone();
            let child = edge.child;
            let mover = node.to_move;
            let depth = node.depth + 1;
            parent_visits = node.visits;
            drop(node);

            self.board.execute(&mv, ExecuteMode::Search);
            self.descent.push(mv);
            self.path.push((node_id, edge_idx));

            if !child.is_none() {
                node_id = child;
                continue;
            }
            match self.materialize(node_id, edge_idx, mover, depth) {
                Some((id, fresh)) => {
                    node_id = id;
                    created = fresh;
                }
                // Pool full: score the move by a playout without a node.
                None => break (None, self.playout()),
            }
        };

        while let Some(mv) = self.descent.pop() {
            self.board.unexecute(&mv);
        }
        self.backpropagate(leaf, &rewards);
    }

    /// Attach a child node for the edge just traversed. Returns the child
    /// and whether this call created it.
    fn materialize(
        &mut self,
        parent: NodeId,
        edge_idx: usize,
        mover: PlayerId,
        depth: u16,
    ) -> Option<(NodeId, bool)> {
        let shared = self.shared;
        let board = &self.board;
        let proven = board.game_over() && board.win_for_player(mover);
        let child = if board.game_over() {
            MctsNode::terminal(parent, board.current_player(), depth, board_rewards(board))
        } else {
            MctsNode::new(parent, board.current_player(), depth)
        };

        let mut node = shared.tree.lock(parent);
        if proven {
            node.edges[edge_idx].proven_win = true;
        }
        let existing = node.edges[edge_idx].child;
        let attached = if existing.is_none() {
            let id = shared.tree.alloc(child);
            if let Some(id) = id {
                node.edges[edge_idx].child = id;
                node.refresh_state();
                shared.max_depth.fetch_max(depth, Ordering::Relaxed);
            }
            id.map(|id| (id, true))
        } else {
            Some((existing, false))
        };
        drop(node);

        if proven && parent == shared.tree.root() {
            shared.finish(StopReason::ProvenWin);
        }
        attached
    }

    /// Play to the end or the move limit, then take every move back.
    fn playout(&mut self) -> PlayerMap<f64> {
        self.stall = 0;
        let limit = self.shared.config.playout_move_limit as usize;
        let rewards = loop {
            if self.board.game_over() {
                break board_rewards(&self.board);
            }
            if self.playout.len() >= limit {
                break draw_rewards(self.board.player_count());
            }
            let mut moves = self.board.legal_moves();
            if moves.is_empty() {
                break draw_rewards(self.board.player_count());
            }
            let pick = self
                .shared
                .simulation
                .choose(&self.board, &moves, &mut self.rng)
                .min(moves.len() - 1);
            let mv = moves.swap_remove(pick);
            self.board.execute(&mv, ExecuteMode::Search);
            self.playout.push(mv);
        };

        self.shared
            .playout_moves
            .fetch_add(self.playout.len() as u64, Ordering::Relaxed);
        while let Some(mv) = self.playout.pop() {
            self.board.unexecute(&mv);
        }
        rewards
    }

    fn backpropagate(&mut self, leaf: Option<NodeId>, rewards: &PlayerMap<f64>) {
        let tree = self.shared.tree;
        if let Some(id) = leaf {
            let mut node = tree.lock(id);
            node.visits += 1;
            node.leaf_visits += 1;
        }
        for (id, edge_idx) in self.path.drain(..).rev() {
            let mut node = tree.lock(id);
            node.visits += 1;
            let edge = &mut node.edges[edge_idx];
            edge.visits += 1;
            edge.in_flight = edge.in_flight.saturating_sub(1);
            edge.total_reward.accumulate(rewards);
        }
    }

    /// Root housekeeping: kill hopeless edges, detect a decided root.
    fn maintain(&mut self) {
        let shared = self.shared;
        let config = shared.config;
        let done = shared.iterations.load(Ordering::Acquire);
        let part = shared.limits.part_done(done);

        let mut root = shared.tree.lock(shared.tree.root());
        if config.kill_mode != KillMode::Off && part > KILL_AFTER {
            let killed = root.kill_hopeless(config.kill_mode, done, part, config.kill_share);
            if killed > 0 {
                shared.killed.fetch_add(killed, Ordering::Relaxed);
                debug!(killed, part_done = part, "Killed hopeless root moves");
            }
        }

        let remaining = (config.early_exit && part > 0.0).then(|| done as f64 / part - done as f64);
        if let Some(reason) = root.decided(remaining) {
            drop(root);
            shared.finish(reason);
        }
    }
}

/// Whether a leaf gets its move list on this visit.
fn should_expand(config: &MctsConfig, node: &MctsNode, parent_visits: u32) -> bool {
    if node.depth < config.guaranteed_tree_depth {
        return true;
    }
    if config.node_expansion_rate > 0.0 {
        f64::from(node.visits) > config.node_expansion_rate * f64::from(parent_visits.max(1)).ln()
    } else {
        node.visits + 1 >= config.expansion_visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expand() {
        let config = MctsConfig::default();
        let mut node = MctsNode::new(NodeId::new(0), PlayerId::new(0), 1);
        assert!(should_expand(&config, &node, 10));

        node.depth = 5;
        assert!(!should_expand(&config, &node, 10));
        node.visits = 2;
        assert!(should_expand(&config, &node, 10));

        let rated = config.with_node_expansion_rate(2.0);
        node.visits = 4;
        // 2 * ln(10) = 4.6
        assert!(!should_expand(&rated, &node, 10));
        node.visits = 5;
        assert!(should_expand(&rated, &node, 10));
    }
}
