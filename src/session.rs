//! The live game: one board, its ledger, and every way a move gets in.
//!
//! Human, network and AI moves all arrive through [`GameSession::apply`],
//! which checks legality before the board ever sees the move. The session
//! keeps a clone of the starting position so any point of the ledger can be
//! rebuilt by replay.

use thiserror::Error;
use tracing::{debug, info};

use crate::core::{GameSetup, Move, WireError};
use crate::history::{rebuild, verify, GameRecord, Ledger, RecordOutcome, ReplayError};
use crate::rules::{AnyBoard, Board, Evaluator, ExecuteMode, GameRegistry, RegistryError};
use crate::search::{Decision, DifficultyTier, Orchestrator};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoveError {
    #[error("illegal move: {0}")]
    Illegal(String),

    #[error("the game is over")]
    GameOver,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Owner of the live board and its ledger.
pub struct GameSession<B: Board> {
    fresh: B,
    board: B,
    ledger: Ledger,
    setup: Option<GameSetup>,
}

impl<B: Board> GameSession<B> {
    /// Start a session at `board`'s current position.
    pub fn new(board: B) -> Self {
        let ledger = Ledger::new(&board);
        Self {
            fresh: board.clone(),
            board,
            ledger,
            setup: None,
        }
    }

    /// Remember the setup so the game can be exported as a record.
    #[must_use]
    pub fn with_setup(mut self, setup: GameSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn setup(&self) -> Option<&GameSetup> {
        self.setup.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.board.game_over()
    }

    /// The position at the review cursor.
    pub fn position(&self) -> Result<B, ReplayError> {
        if self.ledger.is_reviewing() {
            rebuild(self.fresh.clone(), &self.ledger, self.ledger.review_position())
        } else {
            Ok(self.board.clone())
        }
    }

    fn check(board: &B, mv: &Move) -> Result<(), MoveError> {
        if board.game_over() {
            return Err(MoveError::GameOver);
        }
        if !board.is_legal(mv) {
            return Err(MoveError::Illegal(board.describe_move(mv)));
        }
        Ok(())
    }

    /// Play `mv` on the live board and record it.
    ///
    /// While reviewing, the move is played from the reviewed position and the
    /// ledger entries after it are discarded.
    pub fn apply(&mut self, mv: &Move) -> Result<RecordOutcome, MoveError> {
        if self.ledger.is_reviewing() {
            let board = self.position()?;
            Self::check(&board, mv)?;
            self.board = board;
        } else {
            Self::check(&self.board, mv)?;
        }

        self.board.execute(mv, ExecuteMode::Live);
        let outcome = self.ledger.record(&self.board, mv);
        debug!(
            mv = %self.board.describe_move(mv),
            ?outcome,
            moves = self.ledger.len(),
            "Move applied"
        );
        Ok(outcome)
    }

    /// Decode a wire-format move and apply it.
    pub fn apply_text(&mut self, text: &str) -> Result<RecordOutcome, MoveError> {
        let mv = self.board.decode_move(text)?;
        self.apply(&mv)
    }

    /// Take back the last recorded move.
    pub fn undo(&mut self) -> Result<Move, MoveError> {
        let entry = self.ledger.pop().ok_or(MoveError::NothingToUndo)?;
        self.board = rebuild(self.fresh.clone(), &self.ledger, self.ledger.len())?;
        Ok(entry.mv)
    }

    // === Review ===

    pub fn review_back(&mut self) -> bool {
        self.ledger.review_back()
    }

    pub fn review_forward(&mut self) -> bool {
        self.ledger.review_forward()
    }

    pub fn review_to(&mut self, n: usize) {
        self.ledger.review_to(n);
    }

    pub fn review_to_end(&mut self) {
        self.ledger.review_to_end();
    }

    // === Synchronization ===

    /// Replay the ledger from the starting position and compare with the
    /// live board.
    pub fn verify(&self) -> Result<(), ReplayError> {
        verify(&self.board, &self.ledger, self.fresh.clone())
    }

    /// Verify, and on a mismatch rebuild the live board and ledger by
    /// replaying the recorded moves. Returns whether a resync happened.
    pub fn verify_or_resync(&mut self) -> Result<bool, ReplayError> {
        match self.verify() {
            Ok(()) => Ok(false),
            Err(e) => {
                info!(error = %e, moves = self.ledger.len(), "Resynchronizing live board from the ledger");
                self.resync()?;
                Ok(true)
            }
        }
    }

    /// Rebuild the live board and ledger from the recorded moves alone.
    pub fn resync(&mut self) -> Result<(), ReplayError> {
        let (board, ledger) = replay_into(self.fresh.clone(), &self.ledger.moves())?;
        self.board = board;
        self.ledger = ledger;
        Ok(())
    }

    /// Export the game. `None` without a setup.
    pub fn record(&self) -> Option<GameRecord> {
        self.setup
            .as_ref()
            .map(|setup| GameRecord::from_ledger(setup.clone(), &self.ledger))
    }

    /// Let the orchestrator choose a move for the side to move, then apply it
    /// like any other move.
    pub fn play_ai<E>(
        &mut self,
        orchestrator: &mut Orchestrator,
        tier: DifficultyTier,
        evaluator: &E,
    ) -> Result<Decision, MoveError>
    where
        E: Evaluator<B> + ?Sized,
    {
        let position = self.position()?;
        if position.game_over() {
            return Err(MoveError::GameOver);
        }
        let decision = orchestrator.choose(&position, tier, evaluator);
        self.apply(&decision.mv)?;
        Ok(decision)
    }
}

impl GameSession<AnyBoard> {
    /// Start a fresh game from the registry.
    pub fn from_registry(registry: &GameRegistry, setup: GameSetup) -> Result<Self, RegistryError> {
        let board = registry.create(&setup)?;
        Ok(Self::new(board).with_setup(setup))
    }

    /// Load a recorded game, replaying every move.
    pub fn from_record(registry: &GameRegistry, record: &GameRecord) -> Result<Self, ReplayError> {
        let fresh = registry.create(&record.setup)?;
        let (board, ledger) = replay_into(fresh.clone(), &record.moves)?;
        Ok(Self {
            fresh,
            board,
            ledger,
            setup: Some(record.setup.clone()),
        })
    }
}

/// Replay `moves` onto `board`, recording a new ledger as it goes.
fn replay_into<B: Board>(mut board: B, moves: &[Move]) -> Result<(B, Ledger), ReplayError> {
    let mut ledger = Ledger::new(&board);
    for (index, mv) in moves.iter().enumerate() {
        if !board.is_legal(mv) {
            return Err(ReplayError::IllegalMove {
                index,
                mv: board.describe_move(mv),
            });
        }
        board.execute(mv, ExecuteMode::Replay);
        ledger.record(&board, mv);
    }
    Ok((board, ledger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect::ConnectBoard;
    use crate::games::standard_registry;

    #[test]
    fn test_apply_and_undo() {
        let mut session = GameSession::new(ConnectBoard::new(3));
        let start = session.board().fingerprint();

        session.apply_text("place B 2 P0").unwrap();
        assert_eq!(session.ledger().len(), 1);
        assert_ne!(session.board().fingerprint(), start);

        assert_eq!(session.undo().unwrap().cell(), Some((1, 2)));
        assert_eq!(session.board().fingerprint(), start);
        assert_eq!(session.undo(), Err(MoveError::NothingToUndo));
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut session = GameSession::new(ConnectBoard::new(3));
        session.apply_text("place A 1 P0").unwrap();
        let err = session.apply_text("place A 1 P1").unwrap_err();
        assert!(matches!(err, MoveError::Illegal(_)));
        assert_eq!(session.ledger().len(), 1);

        assert!(matches!(session.apply_text("jump A 1"), Err(MoveError::Wire(_))));
    }

    #[test]
    fn test_apply_while_reviewing_truncates() {
        let mut session = GameSession::new(ConnectBoard::new(3));
        for text in ["place A 1 P0", "place B 1 P1", "place C 1 P0"] {
            session.apply_text(text).unwrap();
        }
        session.review_to(1);
        assert_eq!(session.position().unwrap().move_number(), 1);

        session.apply_text("place C 2 P1").unwrap();
        assert_eq!(session.ledger().len(), 2);
        assert!(!session.ledger().is_reviewing());
        assert!(session.verify().is_ok());
    }

    #[test]
    fn test_record_round_trip() {
        let registry = standard_registry().unwrap();
        let mut session = GameSession::from_registry(&registry, GameSetup::new("connect", 2)).unwrap();
        session.apply_text("place A 1 P0").unwrap();
        session.apply_text("place B 2 P1").unwrap();

        let record = session.record().unwrap();
        let loaded = GameSession::from_record(&registry, &record).unwrap();
        assert_eq!(loaded.board().fingerprint(), session.board().fingerprint());
        assert_eq!(loaded.ledger().len(), 2);
    }
}
