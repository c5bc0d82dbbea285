//! One-ply weighted random play for the weakest tier.

use crate::core::{GameRng, Move};
use crate::rules::{bounded, Board, Evaluator, VALUE_OF_WIN};

use super::adapter::SearchAdapter;

/// Softmax temperature over bounded evaluations.
pub const DEFAULT_TEMPERATURE: f64 = 200.0;

/// Result of a weighted random choice.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedChoice {
    pub mv: Move,
    /// One-ply score of `mv` for the mover.
    pub score: f64,
    /// Moves scored.
    pub nodes: u64,
}

/// Score each legal move one ply deep, then draw one with probability
/// proportional to `exp(score / temperature)`.
///
/// An immediate win is always taken.
///
/// # Panics
///
/// If `board` has no legal moves.
pub fn weighted_random<B, E>(board: B, evaluator: &E, temperature: f64, rng: &mut GameRng) -> WeightedChoice
where
    B: Board,
    E: Evaluator<B> + ?Sized,
{
    let mut adapter = SearchAdapter::new(board);
    let mover = adapter.current_player();
    let moves = adapter.legal_moves();
    assert!(!moves.is_empty(), "weighted random root has no legal moves");

    let scores: Vec<f64> = moves
        .iter()
        .map(|mv| {
            adapter.make(mv);
            let board = adapter.board();
            let score = if board.win_for_player(mover) {
                VALUE_OF_WIN
            } else {
                bounded(evaluator.evaluate(board, mover))
            };
            adapter.unmake();
            score
        })
        .collect();

    let nodes = moves.len() as u64;
    if let Some(win) = scores.iter().position(|&s| s >= VALUE_OF_WIN) {
        return WeightedChoice {
            mv: moves[win].clone(),
            score: scores[win],
            nodes,
        };
    }

    let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let temperature = temperature.max(f64::MIN_POSITIVE);
    let weights: Vec<f64> = scores
        .iter()
        .map(|s| ((s - best) / temperature).exp())
        .collect();

    let pick = rng.choose_weighted(&weights).unwrap_or(0);
    WeightedChoice {
        mv: moves[pick].clone(),
        score: scores[pick],
        nodes,
    }
}
