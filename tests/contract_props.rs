//! Property tests for the board contract on both reference games.

use proptest::prelude::*;

use rust_boardgame::games::connect::ConnectBoard;
use rust_boardgame::games::stones::StonesBoard;
use rust_boardgame::history::replay_moves;
use rust_boardgame::rules::{Board, ExecuteMode};
use rust_boardgame::Move;

/// Play up to `picks.len()` moves, each chosen by index modulo the legal
/// move count.
fn play_line<B: Board>(board: &mut B, picks: &[usize], mode: ExecuteMode) -> Vec<Move> {
    let mut played = Vec::new();
    for &pick in picks {
        if board.game_over() {
            break;
        }
        let moves = board.legal_moves();
        let mv = moves[pick % moves.len()].clone();
        board.execute(&mv, mode);
        played.push(mv);
    }
    played
}

fn check_round_trip<B: Board>(mut board: B, picks: &[usize]) -> Result<(), TestCaseError> {
    let mut trail = Vec::new();
    for &pick in picks {
        if board.game_over() {
            break;
        }
        let moves = board.legal_moves();
        prop_assert_eq!(&moves, &board.legal_moves());
        let mv = moves[pick % moves.len()].clone();
        trail.push((board.fingerprint(), board.current_player(), board.move_number(), moves, mv.clone()));
        board.execute(&mv, ExecuteMode::Search);
    }

    while let Some((fingerprint, player, number, moves, mv)) = trail.pop() {
        board.unexecute(&mv);
        prop_assert_eq!(board.fingerprint(), fingerprint);
        prop_assert_eq!(board.current_player(), player);
        prop_assert_eq!(board.move_number(), number);
        prop_assert_eq!(board.legal_moves(), moves);
    }
    Ok(())
}

fn check_wire<B: Board>(mut board: B, picks: &[usize]) -> Result<(), TestCaseError> {
    for mv in play_line(&mut board.clone(), picks, ExecuteMode::Search) {
        let text = board.encode_move(&mv).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(board.decode_move(&text).ok(), Some(mv.clone()));
        board.execute(&mv, ExecuteMode::Live);
    }
    Ok(())
}

fn check_replay<B: Board>(fresh: B, picks: &[usize]) -> Result<(), TestCaseError> {
    let mut live = fresh.clone();
    let moves = play_line(&mut live, picks, ExecuteMode::Live);

    let mut replayed = fresh;
    let fingerprints = replay_moves(&mut replayed, &moves)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(replayed.fingerprint(), live.fingerprint());
    prop_assert_eq!(fingerprints.last().copied(), Some(live.fingerprint()));
    prop_assert_eq!(replayed.result(), live.result());
    Ok(())
}

fn picks() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<usize>(), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_connect_unexecute_restores(picks in picks()) {
        check_round_trip(ConnectBoard::new(5), &picks)?;
    }

    #[test]
    fn prop_stones_unexecute_restores(picks in picks()) {
        check_round_trip(StonesBoard::new(5), &picks)?;
    }

    #[test]
    fn prop_connect_wire_round_trip(picks in picks()) {
        check_wire(ConnectBoard::new(5), &picks)?;
    }

    #[test]
    fn prop_stones_wire_round_trip(picks in picks()) {
        check_wire(StonesBoard::new(5), &picks)?;
    }

    #[test]
    fn prop_connect_replay_matches_live(picks in picks()) {
        check_replay(ConnectBoard::new(5), &picks)?;
    }

    #[test]
    fn prop_stones_replay_matches_live(picks in picks()) {
        check_replay(StonesBoard::new(5), &picks)?;
    }
}
