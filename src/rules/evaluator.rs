//! Pluggable static evaluation for alpha-beta search.
//!
//! Evaluations are bounded to `[-MAX_EVALUATION, MAX_EVALUATION]`. Won
//! positions score `VALUE_OF_WIN`, two orders of magnitude outside that
//! range, so a win is never confused with a good position.

use crate::core::PlayerId;

use super::board::Board;

/// Bound on ordinary positional scores.
pub const MAX_EVALUATION: f64 = 10_000.0;

/// Score of a won position, before depth adjustment.
pub const VALUE_OF_WIN: f64 = 1_000_000.0;

/// Scores below this magnitude are positional; above it they are wins or losses.
pub const WIN_THRESHOLD: f64 = VALUE_OF_WIN / 2.0;

/// Static evaluation of a position from one player's point of view.
pub trait Evaluator<B: Board>: Send + Sync {
    /// Higher is better for `player`.
    fn evaluate(&self, board: &B, player: PlayerId) -> f64;
}

impl<B, F> Evaluator<B> for F
where
    B: Board,
    F: Fn(&B, PlayerId) -> f64 + Send + Sync,
{
    fn evaluate(&self, board: &B, player: PlayerId) -> f64 {
        self(board, player)
    }
}

/// Scores every position zero. Search then relies on terminal detection alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEvaluator;

impl<B: Board> Evaluator<B> for NullEvaluator {
    fn evaluate(&self, _board: &B, _player: PlayerId) -> f64 {
        0.0
    }
}

/// Clamp a raw evaluation into the positional range. NaN maps to zero.
#[must_use]
pub fn bounded(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-MAX_EVALUATION, MAX_EVALUATION)
    }
}

/// Whether a search score denotes a forced win or loss.
#[must_use]
pub fn is_decisive(score: f64) -> bool {
    score.abs() >= WIN_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded() {
        assert_eq!(bounded(5.0), 5.0);
        assert_eq!(bounded(1e9), MAX_EVALUATION);
        assert_eq!(bounded(-1e9), -MAX_EVALUATION);
        assert_eq!(bounded(f64::NAN), 0.0);
    }

    #[test]
    fn test_win_is_far_from_positional_range() {
        assert!(!is_decisive(MAX_EVALUATION));
        assert!(is_decisive(VALUE_OF_WIN - 1000.0));
        assert!(is_decisive(-VALUE_OF_WIN));
        assert!(WIN_THRESHOLD > MAX_EVALUATION * 10.0);
    }
}
