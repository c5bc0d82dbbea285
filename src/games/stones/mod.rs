//! Small capture game with two-step relocation moves.
//!
//! Exercises the parts of the board contract a pure placement game does not:
//! multi-step turns (`pick` then `drop`), auxiliary state in the fingerprint
//! (capture counts, the held stone), pass handling and ledger elision of a
//! pick that is dropped back in place.

mod game;
mod phase;

pub use game::{StonesBoard, CAPTURE, DEFAULT_CAPTURE_TARGET, DEFAULT_SIZE, DROP, PICK, PLACE};
pub use phase::{Phase, Step};

use crate::core::PlayerId;
use crate::rules::{bounded, Evaluator};

/// Material evaluation: captures dominate, stones on the board break ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct StonesEvaluator;

impl Evaluator<StonesBoard> for StonesEvaluator {
    fn evaluate(&self, board: &StonesBoard, player: PlayerId) -> f64 {
        let opponent = player.next(2);
        let captures = f64::from(board.captures(player)) - f64::from(board.captures(opponent));
        let stones = board.stone_count(player) as f64 - board.stone_count(opponent) as f64;
        bounded(captures * 1000.0 + stones * 10.0)
    }
}
