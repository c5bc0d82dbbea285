//! The board contract every game module implements.
//!
//! Search, replay and the live session all drive games exclusively through
//! this trait:
//! - `execute` / `unexecute` move the state forward and back (LIFO)
//! - `legal_moves` enumerates the side to move's options
//! - `fingerprint` summarizes all game-relevant state
//! - `game_over` / `win_for_player` answer terminal queries

use serde::{Deserialize, Serialize};

use crate::core::{Fingerprint, Move, PlayerId, Vocabulary, WireError};

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
    /// Multiple winners (shared victory).
    Winners(Vec<PlayerId>),
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        match self {
            GameResult::Winner(p) => *p == player,
            GameResult::Winners(ps) => ps.contains(&player),
            GameResult::Draw => false,
        }
    }
}

/// Why a move is being executed.
///
/// Games may skip display-only bookkeeping outside `Live`, but the resulting
/// game-relevant state (and therefore the fingerprint) must not depend on the
/// mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecuteMode {
    /// A move entering the live game.
    Live,
    /// A move re-applied from a stored ledger or record.
    Replay,
    /// Lookahead on a private clone.
    Search,
}

/// Board contract.
///
/// ## Implementation Notes
///
/// - `clone` must be a deep copy: mutating a clone never affects the source
/// - `unexecute(m)` is only valid immediately after `execute(m)` (or after
///   the moves executed later have themselves been unexecuted)
/// - `legal_moves` must be complete and return the same order every time it
///   is called on an unchanged state; every returned move must be accepted by
///   `execute`
/// - Protocol misuse (an illegal move, an unexecute with nothing to undo)
///   panics
pub trait Board: Clone + Send + 'static {
    fn player_count(&self) -> usize;

    /// The seat whose move it is.
    fn current_player(&self) -> PlayerId;

    /// Count of moves applied since the initial state.
    fn move_number(&self) -> u32;

    /// Apply a move.
    fn execute(&mut self, mv: &Move, mode: ExecuteMode);

    /// Undo the most recent `execute` of `mv`.
    fn unexecute(&mut self, mv: &Move);

    /// Reproducible hash of all game-relevant state.
    fn fingerprint(&self) -> Fingerprint;

    /// Complete, order-stable list of legal moves for the side to move.
    fn legal_moves(&self) -> Vec<Move>;

    fn game_over(&self) -> bool;

    fn win_for_player(&self, player: PlayerId) -> bool;

    /// The game's keyword table for the move wire format.
    fn vocabulary(&self) -> &'static Vocabulary;

    /// Whether `later` may undo `earlier`.
    ///
    /// Only a candidate: the ledger elides the pair only if the fingerprint,
    /// player and move number after `later` also match the state before
    /// `earlier`.
    fn cancels(&self, _earlier: &Move, _later: &Move) -> bool {
        false
    }

    /// Outcome once `game_over()` holds.
    fn result(&self) -> Option<GameResult> {
        if !self.game_over() {
            return None;
        }

        let winners: Vec<PlayerId> = PlayerId::all(self.player_count())
            .filter(|&p| self.win_for_player(p))
            .collect();

        Some(match winners.as_slice() {
            [] => GameResult::Draw,
            [one] => GameResult::Winner(*one),
            _ => GameResult::Winners(winners),
        })
    }

    /// Canonical text of a move in this game's vocabulary.
    fn encode_move(&self, mv: &Move) -> Result<String, WireError> {
        mv.encode(self.vocabulary())
    }

    /// Move text for logs and error messages; never fails.
    fn describe_move(&self, mv: &Move) -> String {
        mv.describe(self.vocabulary())
    }

    /// Parse a move in this game's vocabulary.
    fn decode_move(&self, text: &str) -> Result<Move, WireError> {
        Move::decode(text, self.vocabulary())
    }

    /// Whether `mv` is in the legal move list.
    fn is_legal(&self, mv: &Move) -> bool {
        self.legal_moves().iter().any(|m| m == mv)
    }
}
