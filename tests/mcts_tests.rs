//! MCTS integration tests using the reference games.

use std::time::{Duration, Instant};

use rust_boardgame::core::{GameRng, Move, OpCode, PlayerId};
use rust_boardgame::games::connect::ConnectBoard;
use rust_boardgame::games::stones::{StonesBoard, CAPTURE, PLACE};
use rust_boardgame::mcts::{
    Edge, KillMode, MctsConfig, MctsNode, MctsSearch, NodeState, SearchTree, StopReason, WeightedPlayout,
};
use rust_boardgame::rules::{Board, ExecuteMode};
use rust_boardgame::search::{Budget, CancelToken, Limits};

const P0: PlayerId = PlayerId::new(0);

fn nodes(n: u64) -> Limits {
    Budget::nodes(n).start(&CancelToken::new())
}

/// X needs (0, 5); (5, 0) is idle.
fn two_open_cells() -> ConnectBoard {
    ConnectBoard::from_rows(
        &[
            "X # # # # .",
            "X # # # # #",
            "X # # # # #",
            "X # # # # #",
            "X # # # # #",
            ". # # # # #",
        ],
        P0,
    )
}

// =============================================================================
// Basic Search Tests
// =============================================================================

#[test]
fn test_mcts_returns_legal_move() {
    let board = ConnectBoard::new(5);
    let search = MctsSearch::new(MctsConfig::default());
    let result = search.search(board.clone(), &nodes(500));

    assert!(board.is_legal(&result.mv));
    assert_eq!(result.root_visits.len(), 25);
    assert!(result.stats.iterations <= 500);
}

#[test]
fn test_mcts_takes_terminal_win() {
    let search = MctsSearch::new(MctsConfig::default());
    let result = search.search(two_open_cells(), &nodes(1_000));

    assert_eq!(result.mv.cell(), Some((0, 5)));
    assert!(result.proven_win);
    assert_eq!(result.stats.stop, Some(StopReason::ProvenWin));
}

#[test]
fn test_mcts_finds_capture_win() {
    // One capture short of the target, with a capture on offer.
    let mut board = StonesBoard::new(4).with_capture_target(1);
    let opening = [
        board.place(1, 1),
        Move::new(PLACE).at(1, 2).by(PlayerId::new(1)),
    ];
    for mv in &opening {
        board.execute(mv, ExecuteMode::Live);
    }
    let search = MctsSearch::new(MctsConfig::default());
    let result = search.search(board, &nodes(2_000));

    assert_eq!(result.mv.op, CAPTURE);
    assert_eq!(result.mv.cell(), Some((1, 2)));
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_mcts_deterministic_with_seed() {
    let config = MctsConfig::default().with_seed(12345);
    let a = MctsSearch::new(config.clone()).search(ConnectBoard::new(5), &nodes(800));
    let b = MctsSearch::new(config).search(ConnectBoard::new(5), &nodes(800));

    assert_eq!(a.mv, b.mv, "Same seed should produce same move");
    assert_eq!(a.root_visits, b.root_visits);
    assert_eq!(a.stats.iterations, b.stats.iterations);
}

#[test]
fn test_mcts_different_seeds_differ() {
    let search = MctsSearch::new(MctsConfig::default().with_early_exit(false));
    let a = search.search_with_rng(ConnectBoard::new(5), &nodes(400), &GameRng::new(111));
    let b = search.search_with_rng(ConnectBoard::new(5), &nodes(400), &GameRng::new(222));

    assert_ne!(a.root_visits, b.root_visits);
}

// =============================================================================
// Termination Tests
// =============================================================================

#[test]
fn test_cancelled_search_still_answers() {
    let token = CancelToken::new();
    token.cancel();
    let limits = Budget::unlimited().start(&token);
    let board = ConnectBoard::new(4);
    let result = MctsSearch::new(MctsConfig::default()).search(board.clone(), &limits);

    assert_eq!(result.stats.stop, Some(StopReason::Cancelled));
    assert_eq!(result.stats.iterations, 0);
    assert!(board.is_legal(&result.mv));
}

#[test]
fn test_deadline() {
    let limits = Budget::time(50).start(&CancelToken::new());
    let start = Instant::now();
    let config = MctsConfig::default().with_early_exit(false).with_kill(KillMode::Off, 0.5);
    let result = MctsSearch::new(config).search(ConnectBoard::new(6), &limits);

    assert_eq!(result.stats.stop, Some(StopReason::Deadline));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_pool_exhaustion() {
    let config = MctsConfig::default()
        .with_max_nodes(10)
        .with_stop_on_pool_exhausted(true);
    let result = MctsSearch::new(config).search(ConnectBoard::new(4), &nodes(1_000));

    assert_eq!(result.stats.stop, Some(StopReason::PoolExhausted));
    assert_eq!(result.stats.nodes, 10);
}

#[test]
fn test_unbounded_search_stops_when_pool_fills() {
    let config = MctsConfig::default().with_max_nodes(200);
    let limits = Budget::unlimited().start(&CancelToken::new());
    let result = MctsSearch::new(config).search(ConnectBoard::new(4), &limits);

    assert_eq!(result.stats.nodes, 200);
    assert!(matches!(
        result.stats.stop,
        Some(StopReason::PoolExhausted | StopReason::Stalled)
    ));
}

#[test]
fn test_hopeless_moves_get_killed() {
    let config = MctsConfig::default()
        .with_early_exit(false)
        .with_kill(KillMode::Visits, 0.5);
    let result = MctsSearch::new(config).search(ConnectBoard::new(3), &nodes(3_000));

    assert!(result.stats.killed > 0);
}

// =============================================================================
// Kill and Early-Exit Tests
// =============================================================================

/// Root with one edge per `(visits, reward for the mover)` pair.
fn root_with(stats: &[(u32, f64)]) -> MctsNode {
    let mut root = MctsNode::root(P0);
    for (i, &(visits, wins)) in stats.iter().enumerate() {
        let mut edge = Edge::new(Move::new(OpCode::game(i as u16)), 2);
        edge.visits = visits;
        edge.total_reward[P0] = wins;
        edge.total_reward[PlayerId::new(1)] = f64::from(visits) - wins;
        root.edges.push(edge);
    }
    root.visits = stats.iter().map(|&(v, _)| v).sum();
    root.state = NodeState::Expanded;
    root
}

/// The move a finished search would report, checked against the kill flags.
fn assert_choice_is_live(root: &MctsNode) -> usize {
    let best = root.best_edge().expect("root has edges");
    assert!(!root.edges[best].killed, "chose killed edge {best}");
    if root.decided(None) == Some(StopReason::SingleChild) {
        let live: Vec<usize> = root.live_edges().map(|(i, _)| i).collect();
        assert_eq!(live, vec![best]);
    }
    best
}

fn chosen_edge(tree: &SearchTree, mv: &Move) -> usize {
    let root = tree.lock(tree.root());
    root.edges.iter().position(|e| &e.mv == mv).expect("chosen move is a root edge")
}

#[test]
fn test_win_rate_kill_spares_most_visited() {
    // The better rate sits on the less visited edge.
    let mut root = root_with(&[(100, 10.0), (50, 40.0)]);
    root.kill_hopeless(KillMode::WinRate, 150, 0.5, 0.5);

    assert!(!root.edges[0].killed);
    assert_eq!(assert_choice_is_live(&root), 0);
}

#[test]
fn test_win_rate_kill_drops_weak_edge() {
    let mut root = root_with(&[(200, 180.0), (120, 12.0), (30, 25.0)]);
    let killed = root.kill_hopeless(KillMode::WinRate, 350, 0.7, 0.5);

    assert_eq!(killed, 1);
    assert!(root.edges[1].killed);
    assert_eq!(assert_choice_is_live(&root), 0);
}

#[test]
fn test_visit_kill_leaves_single_child() {
    let mut root = root_with(&[(900, 500.0), (40, 10.0), (20, 5.0)]);
    let killed = root.kill_hopeless(KillMode::Visits, 960, 0.8, 0.5);

    assert_eq!(killed, 2);
    assert_eq!(root.decided(None), Some(StopReason::SingleChild));
    assert_eq!(assert_choice_is_live(&root), 0);
}

#[test]
fn test_killed_leader_is_not_chosen() {
    let mut root = root_with(&[(100, 10.0), (50, 40.0)]);
    root.edges[0].killed = true;

    assert_eq!(root.decided(None), Some(StopReason::SingleChild));
    assert_eq!(assert_choice_is_live(&root), 1);
}

#[test]
fn test_dominance_verdict_follows_leader() {
    let root = root_with(&[(60, 30.0), (700, 400.0), (90, 40.0)]);

    assert_eq!(root.decided(Some(200.0)), Some(StopReason::Dominance));
    assert_eq!(root.decided(Some(800.0)), None);
    assert_eq!(assert_choice_is_live(&root), 1);
}

#[test]
fn test_win_rate_search_returns_live_move() {
    let config = MctsConfig::default()
        .with_early_exit(false)
        .with_kill(KillMode::WinRate, 0.5);
    let board = ConnectBoard::new(3);
    let (result, tree) = MctsSearch::new(config).search_with_tree(board.clone(), &nodes(3_000), &GameRng::new(17));

    assert!(board.is_legal(&result.mv));
    let chosen = chosen_edge(&tree, &result.mv);
    let root = tree.lock(tree.root());
    assert!(!root.edges[chosen].killed);
    assert_eq!(assert_choice_is_live(&root), chosen);
}

#[test]
fn test_early_exit_reports_leader() {
    let config = MctsConfig::default().with_kill(KillMode::Visits, 0.5);
    let board = ConnectBoard::new(3);
    let (result, tree) = MctsSearch::new(config).search_with_tree(board.clone(), &nodes(20_000), &GameRng::new(5));

    let chosen = chosen_edge(&tree, &result.mv);
    let root = tree.lock(tree.root());
    assert!(!root.edges[chosen].killed);
    match result.stats.stop {
        Some(StopReason::SingleChild) => assert_eq!(root.live_edges().count(), 1),
        Some(StopReason::Dominance) => {
            let top = root.live_edges().map(|(_, e)| e.visits).max();
            assert_eq!(Some(root.edges[chosen].visits), top);
        }
        _ => {}
    }
}

// =============================================================================
// Multi-threaded Tests
// =============================================================================

#[test]
fn test_multi_threaded_search_keeps_visit_invariant() {
    let config = MctsConfig::default()
        .with_threads(4)
        .with_early_exit(false)
        .with_kill(KillMode::Off, 0.5);
    let board = ConnectBoard::new(5);
    let (result, tree) = MctsSearch::new(config).search_with_tree(board.clone(), &nodes(3_000), &GameRng::new(9));

    assert!(board.is_legal(&result.mv));
    assert_eq!(result.stats.threads, 4);
    assert_eq!(result.stats.iterations, 3_000);
    assert_eq!(tree.lock(tree.root()).visits, 3_000);
    assert_eq!(tree.check_visits(), Ok(()));
    assert_eq!(tree.stats().node_count, result.stats.nodes);
}

#[test]
fn test_multi_threaded_multi_step_game() {
    let config = MctsConfig::default().with_threads(3);
    let board = StonesBoard::new(4);
    let before = board.fingerprint();
    let (result, tree) = MctsSearch::new(config).search_with_tree(board.clone(), &nodes(2_000), &GameRng::new(4));

    assert!(board.is_legal(&result.mv));
    assert_eq!(board.fingerprint(), before);
    assert_eq!(tree.check_visits(), Ok(()));
}

#[test]
fn test_weighted_playout() {
    // Playouts that never pass.
    let policy = WeightedPlayout::new(|_: &StonesBoard, mv: &Move| {
        if mv.op == OpCode::PASS {
            0.0
        } else {
            1.0
        }
    });
    let search = MctsSearch::new(MctsConfig::default()).with_simulation(policy);
    let board = StonesBoard::new(4);
    let result = search.search(board.clone(), &nodes(300));

    assert!(board.is_legal(&result.mv));
    assert!(result.stats.playout_moves > 0);
}
