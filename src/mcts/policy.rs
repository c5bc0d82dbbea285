//! MCTS policies for selection and simulation.
//!
//! Policies are trait-based to allow customization:
//! - `SelectionPolicy`: how to value an edge during descent (UCT)
//! - `SimulationPolicy`: which move a playout makes next (uniform, weighted)

use crate::core::{GameRng, Move, PlayerId, PlayerMap};
use crate::rules::{Board, GameResult};

use super::config::MctsConfig;
use super::node::{Edge, MctsNode};

// =============================================================================
// Selection Policy
// =============================================================================

/// Values edges during descent. Higher is selected.
pub trait SelectionPolicy: Send + Sync {
    /// Value of `edge` for `player` when its parent has `parent_visits`.
    fn value(&self, edge: &Edge, parent_visits: u32, player: PlayerId, config: &MctsConfig) -> f64;
}

/// UCT: `mean + alpha * sqrt(ln(N) / (n + 1))`.
///
/// Traversals still in flight count as visits with zero reward, which
/// spreads concurrent workers over different edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uct;

impl SelectionPolicy for Uct {
    fn value(&self, edge: &Edge, parent_visits: u32, player: PlayerId, config: &MctsConfig) -> f64 {
        let n = f64::from(edge.visits + edge.in_flight);
        let mean = if n == 0.0 {
            0.0
        } else {
            edge.total_reward[player] / n
        };
        let ln_parent = f64::from(parent_visits.max(1)).ln();
        mean + config.exploration * (ln_parent / (n + 1.0)).sqrt()
    }
}

/// Choose the edge to descend through.
///
/// A proven win is always taken. Otherwise an untouched edge is grown
/// first (a random one when `randomize_new_children`), then the live edge
/// with the highest policy value, ties broken at random. Killed edges are
/// skipped. Returns `None` only when no edge is live.
pub fn select_edge(
    node: &MctsNode,
    policy: &dyn SelectionPolicy,
    config: &MctsConfig,
    rng: &mut GameRng,
) -> Option<usize> {
    if let Some(win) = node.proven_win() {
        return Some(win);
    }

    let fresh: Vec<usize> = node
        .live_edges()
        .filter(|(_, e)| e.is_fresh() && !e.is_expanded())
        .map(|(i, _)| i)
        .collect();
    if !fresh.is_empty() {
        let pick = if config.randomize_new_children {
            rng.gen_range_usize(0..fresh.len())
        } else {
            0
        };
        return Some(fresh[pick]);
    }

    let mut best_value = f64::NEG_INFINITY;
    let mut ties: Vec<usize> = Vec::new();
    for (i, edge) in node.live_edges() {
        let value = policy.value(edge, node.visits, node.to_move, config);
        if value > best_value + 1e-12 {
            best_value = value;
            ties.clear();
            ties.push(i);
        } else if (value - best_value).abs() <= 1e-12 {
            ties.push(i);
        }
    }
    match ties.len() {
        0 => None,
        1 => Some(ties[0]),
        n => Some(ties[rng.gen_range_usize(0..n)]),
    }
}

// =============================================================================
// Simulation Policy
// =============================================================================

/// Chooses playout moves.
pub trait SimulationPolicy<B: Board>: Send + Sync {
    /// Index into `moves` (never empty) of the move to play on `board`.
    fn choose(&self, board: &B, moves: &[Move], rng: &mut GameRng) -> usize;
}

/// Uniformly random playouts.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformPlayout;

impl<B: Board> SimulationPolicy<B> for UniformPlayout {
    fn choose(&self, _board: &B, moves: &[Move], rng: &mut GameRng) -> usize {
        rng.gen_range_usize(0..moves.len())
    }
}

/// Playouts biased by a game-supplied move weight.
///
/// Non-positive weights are never chosen unless every weight is
/// non-positive, in which case the choice is uniform.
pub struct WeightedPlayout<F> {
    weight: F,
}

impl<F> WeightedPlayout<F> {
    pub fn new(weight: F) -> Self {
        Self { weight }
    }
}

impl<B, F> SimulationPolicy<B> for WeightedPlayout<F>
where
    B: Board,
    F: Fn(&B, &Move) -> f64 + Send + Sync,
{
    fn choose(&self, board: &B, moves: &[Move], rng: &mut GameRng) -> usize {
        let weights: Vec<f64> = moves.iter().map(|m| (self.weight)(board, m)).collect();
        rng.choose_weighted(&weights)
            .unwrap_or_else(|| rng.gen_range_usize(0..moves.len()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Convert a game result to per-player rewards in `[0, 1]`.
pub fn result_to_rewards(result: &GameResult, player_count: usize) -> PlayerMap<f64> {
    PlayerMap::new(player_count, |player| match result {
        GameResult::Draw => 0.5,
        other if other.is_winner(player) => 1.0,
        _ => 0.0,
    })
}

/// Rewards for a finished board, or a draw for an unfinished one.
pub fn board_rewards<B: Board>(board: &B) -> PlayerMap<f64> {
    match board.result() {
        Some(result) => result_to_rewards(&result, board.player_count()),
        None => draw_rewards(board.player_count()),
    }
}

#[must_use]
pub fn draw_rewards(player_count: usize) -> PlayerMap<f64> {
    PlayerMap::with_value(player_count, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OpCode;
    use crate::mcts::node::NodeState;

    const P0: PlayerId = PlayerId::new(0);

    fn make_test_node() -> MctsNode {
        let mut node = MctsNode::root(P0);
        node.state = NodeState::Expanded;

        // Edge 0: high reward, many visits
        let mut e0 = Edge::new(Move::new(OpCode::game(1)), 2);
        e0.visits = 100;
        e0.total_reward[P0] = 80.0;
        e0.child = crate::mcts::NodeId::new(1);

        // Edge 1: lower reward, fewer visits
        let mut e1 = Edge::new(Move::new(OpCode::game(2)), 2);
        e1.visits = 10;
        e1.total_reward[P0] = 7.0;
        e1.child = crate::mcts::NodeId::new(2);

        // Edge 2: unvisited
        let e2 = Edge::new(Move::new(OpCode::game(3)), 2);

        node.edges.push(e0);
        node.edges.push(e1);
        node.edges.push(e2);
        node.visits = 110;
        node
    }

    #[test]
    fn test_unvisited_edge_grows_first() {
        let node = make_test_node();
        let config = MctsConfig::default();
        let selected = select_edge(&node, &Uct, &config, &mut GameRng::new(1));
        assert_eq!(selected, Some(2));
    }

    #[test]
    fn test_killed_edges_are_skipped() {
        let mut node = make_test_node();
        node.edges[2].killed = true;
        node.edges[0].killed = true;
        let selected = select_edge(&node, &Uct, &MctsConfig::default(), &mut GameRng::new(1));
        assert_eq!(selected, Some(1));
    }

    #[test]
    fn test_proven_win_is_always_taken() {
        let mut node = make_test_node();
        node.edges[1].proven_win = true;
        let selected = select_edge(&node, &Uct, &MctsConfig::default(), &mut GameRng::new(1));
        assert_eq!(selected, Some(1));
    }

    #[test]
    fn test_uct_value() {
        let mut edge = Edge::new(Move::pass(P0), 2);
        edge.visits = 3;
        edge.total_reward[P0] = 3.0;
        let config = MctsConfig::default().with_exploration(1.0);
        let expected = 1.0 + (f64::from(16u32).ln() / 4.0).sqrt();
        assert!((Uct.value(&edge, 16, P0, &config) - expected).abs() < 1e-12);

        // In-flight traversals dilute the mean.
        edge.in_flight = 1;
        assert!(Uct.value(&edge, 16, P0, &config) < expected);
    }

    #[test]
    fn test_weighted_playout_skips_zero_weights() {
        let board = crate::games::connect::ConnectBoard::new(3);
        let moves = board.legal_moves();
        let policy = WeightedPlayout::new(|_: &crate::games::connect::ConnectBoard, m: &Move| {
            if m.cell() == Some((1, 1)) {
                1.0
            } else {
                0.0
            }
        });
        let mut rng = GameRng::new(5);
        for _ in 0..10 {
            assert_eq!(moves[policy.choose(&board, &moves, &mut rng)].cell(), Some((1, 1)));
        }
    }

    #[test]
    fn test_result_to_rewards() {
        let rewards = result_to_rewards(&GameResult::Winner(PlayerId::new(1)), 3);
        assert_eq!(rewards[P0], 0.0);
        assert_eq!(rewards[PlayerId::new(1)], 1.0);
        assert_eq!(rewards[PlayerId::new(2)], 0.0);

        let draw = result_to_rewards(&GameResult::Draw, 2);
        assert_eq!(draw[P0], 0.5);
    }
}
