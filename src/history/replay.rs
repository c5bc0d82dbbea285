//! Game records, replay and replay verification.
//!
//! A record is a setup token followed by one canonical move per line:
//!
//! ```text
//! setup stones 0 2 0
//! place B 2 P0
//! place B 3 P1
//! capture B 3 P0
//! pass P1
//! ```
//!
//! Replaying a record from a fresh board must reproduce the fingerprint
//! sequence of the original game. A mismatch means some game's
//! `execute`/`unexecute` pair is asymmetric, which is a bug, never a user
//! error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::core::{Fingerprint, GameSetup, Move, Vocabulary, WireError};
use crate::rules::{AnyBoard, Board, ExecuteMode, GameRegistry, RegistryError};

use super::ledger::{Checkpoint, Ledger};

/// Replay and record failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("line {line}: {source}")]
    Wire {
        line: usize,
        #[source]
        source: WireError,
    },

    #[error("record has no setup line")]
    MissingSetup,

    #[error("move {index} ({mv}) is not legal")]
    IllegalMove { index: usize, mv: String },

    #[error("replay diverged after {moves} moves: expected {expected}, got {actual}")]
    Divergence {
        moves: usize,
        expected: Checkpoint,
        actual: Checkpoint,
    },

    #[error("record encoding failed: {0}")]
    Encoding(String),
}

/// A portable game: setup plus move list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub setup: GameSetup,
    pub moves: Vec<Move>,
}

impl GameRecord {
    #[must_use]
    pub fn new(setup: GameSetup) -> Self {
        Self {
            setup,
            moves: Vec::new(),
        }
    }

    /// Record of every move in `ledger`.
    #[must_use]
    pub fn from_ledger(setup: GameSetup, ledger: &Ledger) -> Self {
        Self {
            setup,
            moves: ledger.moves(),
        }
    }

    /// Text form in `vocab`.
    pub fn to_text(&self, vocab: &Vocabulary) -> Result<String, ReplayError> {
        let mut out = self.setup.to_token();
        for (i, mv) in self.moves.iter().enumerate() {
            let text = mv
                .encode(vocab)
                .map_err(|source| ReplayError::Wire { line: i + 2, source })?;
            out.push('\n');
            out.push_str(&text);
        }
        out.push('\n');
        Ok(out)
    }

    /// Parse the text form with a known vocabulary. Blank lines are skipped.
    pub fn parse_with(text: &str, vocab: &Vocabulary) -> Result<Self, ReplayError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());

        let (setup_line, setup_text) = lines.next().ok_or(ReplayError::MissingSetup)?;
        let setup = GameSetup::from_token(setup_text).map_err(|source| ReplayError::Wire {
            line: setup_line + 1,
            source,
        })?;

        let moves = lines
            .map(|(i, l)| {
                Move::decode(l, vocab).map_err(|source| ReplayError::Wire { line: i + 1, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { setup, moves })
    }

    /// Parse the text form, taking the vocabulary from the game the setup
    /// line names.
    pub fn parse(text: &str, registry: &GameRegistry) -> Result<Self, ReplayError> {
        let (line, setup_text) = text
            .lines()
            .enumerate()
            .find(|(_, l)| !l.trim().is_empty())
            .ok_or(ReplayError::MissingSetup)?;
        let setup = GameSetup::from_token(setup_text)
            .map_err(|source| ReplayError::Wire { line: line + 1, source })?;
        let board = registry.create(&setup)?;
        Self::parse_with(text, board.vocabulary())
    }

    /// Compact binary form for transmission.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        bincode::serialize(self).map_err(|e| ReplayError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReplayError> {
        bincode::deserialize(bytes).map_err(|e| ReplayError::Encoding(e.to_string()))
    }

    /// Fingerprint after each move, starting with the initial state.
    ///
    /// Two games with the same sequence were played identically.
    pub fn fingerprints(&self, registry: &GameRegistry) -> Result<Vec<Fingerprint>, ReplayError> {
        replay(registry, self).map(|(_, fps)| fps)
    }
}

/// Apply `moves` to `board` in replay mode, checking legality first.
///
/// Returns the fingerprint after every move, initial state first.
pub fn replay_moves<B: Board>(board: &mut B, moves: &[Move]) -> Result<Vec<Fingerprint>, ReplayError> {
    let mut fingerprints = Vec::with_capacity(moves.len() + 1);
    fingerprints.push(board.fingerprint());

    for (index, mv) in moves.iter().enumerate() {
        if !board.is_legal(mv) {
            return Err(ReplayError::IllegalMove {
                index,
                mv: board.describe_move(mv),
            });
        }
        board.execute(mv, ExecuteMode::Replay);
        fingerprints.push(board.fingerprint());
    }
    Ok(fingerprints)
}

/// Rebuild a record's final position from the registry.
pub fn replay(
    registry: &GameRegistry,
    record: &GameRecord,
) -> Result<(AnyBoard, Vec<Fingerprint>), ReplayError> {
    let mut board = registry.create(&record.setup)?;
    let fingerprints = replay_moves(&mut board, &record.moves)?;
    debug!(
        game = %record.setup.game_id,
        moves = record.moves.len(),
        fingerprint = %board.fingerprint(),
        "Replayed record"
    );
    Ok((board, fingerprints))
}

/// Replay the first `n` ledger moves onto `fresh`, checking every step
/// against the fingerprint the ledger stored for it.
pub fn rebuild<B: Board>(mut fresh: B, ledger: &Ledger, n: usize) -> Result<B, ReplayError> {
    let start = Checkpoint::of(&fresh);
    if start != ledger.initial() {
        return Err(ReplayError::Divergence {
            moves: 0,
            expected: ledger.initial(),
            actual: start,
        });
    }

    for (index, entry) in ledger.entries().iter().take(n).enumerate() {
        if !fresh.is_legal(&entry.mv) {
            return Err(ReplayError::IllegalMove {
                index,
                mv: fresh.describe_move(&entry.mv),
            });
        }
        fresh.execute(&entry.mv, ExecuteMode::Replay);
        let actual = Checkpoint::of(&fresh);
        if actual != entry.checkpoint() {
            return Err(ReplayError::Divergence {
                moves: index + 1,
                expected: entry.checkpoint(),
                actual,
            });
        }
    }
    Ok(fresh)
}

/// Check that replaying `ledger` from `fresh` lands exactly on `live`.
///
/// A mismatch is logged at error level; the caller should resynchronize the
/// live board from the ledger.
pub fn verify<B: Board>(live: &B, ledger: &Ledger, fresh: B) -> Result<(), ReplayError> {
    let result = rebuild(fresh, ledger, ledger.len()).and_then(|replayed| {
        let expected = Checkpoint::of(live);
        let actual = Checkpoint::of(&replayed);
        if expected == actual {
            Ok(())
        } else {
            Err(ReplayError::Divergence {
                moves: ledger.len(),
                expected,
                actual,
            })
        }
    });

    if let Err(e) = &result {
        error!(error = %e, moves = ledger.len(), "Replay verification failed");
    }
    result
}
