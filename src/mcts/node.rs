//! MCTS node and edge structures.
//!
//! Nodes live in a preallocated pool and refer to each other by `NodeId`.
//! Visit and reward statistics for a move live on the parent's edge, so a
//! node's visit count is the sum of its edges' visits plus the playouts that
//! started (or terminal positions that were scored) at the node itself.

use serde::{Deserialize, Serialize};

use crate::core::{Move, PlayerId, PlayerMap};

use super::config::KillMode;
use super::stats::StopReason;

/// Index into the node pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// Expansion status of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Leaf; move list not yet materialized.
    Unexpanded,
    /// One worker is generating the move list; others treat it as a leaf.
    Expanding,
    /// Edges exist, some without a child node.
    Expanded,
    /// Every edge has a child node.
    FullyExplored,
}

/// A move out of a node and its statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub mv: Move,

    /// Child node (NONE until materialized).
    pub child: NodeId,

    /// Completed traversals of this edge.
    pub visits: u32,

    /// Traversals in progress on other workers; counted as losses by
    /// selection until they complete.
    pub in_flight: u32,

    /// Sum of playout rewards, per player.
    pub total_reward: PlayerMap<f64>,

    /// Removed from selection by the hopeless-children pass.
    pub killed: bool,

    /// The move ends the game in the mover's favour.
    pub proven_win: bool,
}

impl Edge {
    pub fn new(mv: Move, player_count: usize) -> Self {
        Self {
            mv,
            child: NodeId::NONE,
            visits: 0,
            in_flight: 0,
            total_reward: PlayerMap::with_value(player_count, 0.0),
            killed: false,
            proven_win: false,
        }
    }

    /// Mean reward for `player` over completed visits.
    #[must_use]
    pub fn mean_reward(&self, player: PlayerId) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward[player] / f64::from(self.visits)
        }
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        !self.child.is_none()
    }

    /// Never visited nor being visited.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.visits == 0 && self.in_flight == 0
    }
}

/// A node in the search tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MctsNode {
    pub parent: NodeId,
    pub to_move: PlayerId,
    /// Depth in the tree (root = 0).
    pub depth: u16,
    /// All visits through or ending at this node.
    pub visits: u32,
    /// Visits that ended here (playout start or terminal score).
    pub leaf_visits: u32,
    pub state: NodeState,
    /// Per-player rewards if the position is final.
    pub terminal: Option<PlayerMap<f64>>,
    pub edges: Vec<Edge>,
}

impl MctsNode {
    pub fn new(parent: NodeId, to_move: PlayerId, depth: u16) -> Self {
        Self {
            parent,
            to_move,
            depth,
            visits: 0,
            leaf_visits: 0,
            state: NodeState::Unexpanded,
            terminal: None,
            edges: Vec::new(),
        }
    }

    pub fn root(to_move: PlayerId) -> Self {
        Self::new(NodeId::NONE, to_move, 0)
    }

    /// A node with final rewards.
    pub fn terminal(parent: NodeId, to_move: PlayerId, depth: u16, rewards: PlayerMap<f64>) -> Self {
        Self {
            terminal: Some(rewards),
            ..Self::new(parent, to_move, depth)
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Install the move list.
    pub fn set_edges(&mut self, moves: Vec<Move>, player_count: usize) {
        self.edges = moves.into_iter().map(|m| Edge::new(m, player_count)).collect();
        self.state = NodeState::Expanded;
    }

    /// Promote to `FullyExplored` once every edge has a child.
    pub fn refresh_state(&mut self) {
        if self.state == NodeState::Expanded && self.edges.iter().all(Edge::is_expanded) {
            self.state = NodeState::FullyExplored;
        }
    }

    /// Edges still open to selection.
    pub fn live_edges(&self) -> impl Iterator<Item = (usize, &Edge)> {
        self.edges.iter().enumerate().filter(|(_, e)| !e.killed)
    }

    #[must_use]
    pub fn proven_win(&self) -> Option<usize> {
        self.edges.iter().position(|e| e.proven_win)
    }

    /// Index of the edge to play: a proven win, else the most visited live
    /// edge.
    ///
    /// Ties go to the earlier edge. Killed edges are never returned.
    #[must_use]
    pub fn best_edge(&self) -> Option<usize> {
        if let Some(win) = self.proven_win() {
            return Some(win);
        }
        let mut best: Option<usize> = None;
        for (i, edge) in self.live_edges() {
            if best.map_or(true, |b| edge.visits > self.edges[b].visits) {
                best = Some(i);
            }
        }
        best
    }

    /// Whether the root is settled: a single live edge remains, or the
    /// leading edge cannot be overtaken within `remaining` more playouts.
    #[must_use]
    pub fn decided(&self, remaining: Option<f64>) -> Option<StopReason> {
        if self.live_edges().count() == 1 {
            return Some(StopReason::SingleChild);
        }
        let remaining = remaining?;
        let mut top = [0u32; 2];
        for (_, edge) in self.live_edges() {
            if edge.visits > top[0] {
                top = [edge.visits, top[0]];
            } else if edge.visits > top[1] {
                top[1] = edge.visits;
            }
        }
        (f64::from(top[1]) + remaining < f64::from(top[0])).then_some(StopReason::Dominance)
    }

    /// Mark edges that can no longer catch up with the best one.
    ///
    /// `visits_so_far` playouts have used `part_done` of the budget; the
    /// remaining playouts are shared among the active edges with exponent
    /// `power`. Returns the number of edges killed. The best edge and proven
    /// wins are never killed.
    pub fn kill_hopeless(&mut self, mode: KillMode, visits_so_far: u64, part_done: f64, power: f64) -> u32 {
        if part_done <= 0.0 || part_done >= 1.0 {
            return 0;
        }
        let so_far = visits_so_far as f64;
        let remaining = so_far / part_done - so_far;
        if remaining <= 0.0 {
            return 0;
        }
        match mode {
            KillMode::Off => 0,
            KillMode::Visits => self.kill_by_visits(remaining, power),
            KillMode::WinRate => self.kill_by_win_rate(remaining, power),
        }
    }

    fn active_edges(&self) -> usize {
        self.live_edges().filter(|(_, e)| e.visits > 0).count().max(1)
    }

    fn kill_by_visits(&mut self, remaining: f64, power: f64) -> u32 {
        let Some(best) = self.best_edge() else {
            return 0;
        };
        let best_visits = f64::from(self.edges[best].visits);
        let mut active = self.active_edges();
        let mut share = remaining / (active as f64).powf(power);

        // Weakest first; each kill enlarges the survivors' share.
        let mut order: Vec<usize> = self
            .live_edges()
            .filter(|&(i, e)| i != best && !e.proven_win)
            .map(|(i, _)| i)
            .collect();
        order.sort_by_key(|&i| self.edges[i].visits);

        let mut killed = 0;
        for i in order {
            if share >= best_visits {
                break;
            }
            let edge = &mut self.edges[i];
            if f64::from(edge.visits) + share < best_visits {
                edge.killed = true;
                killed += 1;
                if edge.visits > 0 {
                    active = active.saturating_sub(1).max(1);
                    share = remaining / (active as f64).powf(power);
                }
            }
        }
        killed
    }

    fn kill_by_win_rate(&mut self, remaining: f64, power: f64) -> u32 {
        let mover = self.to_move;
        let Some(best) = self.best_edge() else {
            return 0;
        };
        if self.edges[best].visits == 0 {
            return 0;
        }
        let rate = self.edges[best].mean_reward(mover);
        let share = remaining / (self.active_edges() as f64).powf(power);

        let mut killed = 0;
        for (i, edge) in self.edges.iter_mut().enumerate() {
            if i == best || edge.killed || edge.proven_win || edge.visits == 0 {
                continue;
            }
            // Extra straight wins this edge needs to draw level with the best rate.
            let n = f64::from(edge.visits);
            let deficit = (n * rate - edge.total_reward[mover]) / (1.0 - rate);
            if deficit > share {
                edge.killed = true;
                killed += 1;
            }
        }
        killed
    }
}
