//! Type-erased boards for runtime game selection.
//!
//! `ErasedBoard` is an object-safe mirror of [`Board`] with a blanket impl
//! for every concrete board. `AnyBoard` (a boxed erased board) implements
//! `Board` itself, so the ledger, replay and both search engines run on
//! registry-created boards without special casing.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::core::{Fingerprint, Move, PlayerId, Vocabulary};

use super::board::{Board, ExecuteMode};
use super::evaluator::Evaluator;

/// A board whose concrete type was chosen at runtime.
pub type AnyBoard = Box<dyn ErasedBoard>;

/// Object-safe form of [`Board`].
pub trait ErasedBoard: Send + 'static {
    fn box_clone(&self) -> AnyBoard;
    fn as_any(&self) -> &dyn Any;
    fn dyn_player_count(&self) -> usize;
    fn dyn_current_player(&self) -> PlayerId;
    fn dyn_move_number(&self) -> u32;
    fn dyn_execute(&mut self, mv: &Move, mode: ExecuteMode);
    fn dyn_unexecute(&mut self, mv: &Move);
    fn dyn_fingerprint(&self) -> Fingerprint;
    fn dyn_legal_moves(&self) -> Vec<Move>;
    fn dyn_game_over(&self) -> bool;
    fn dyn_win_for_player(&self, player: PlayerId) -> bool;
    fn dyn_vocabulary(&self) -> &'static Vocabulary;
    fn dyn_cancels(&self, earlier: &Move, later: &Move) -> bool;
}

impl fmt::Debug for dyn ErasedBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyBoard")
            .field("to_move", &self.dyn_current_player())
            .field("move_number", &self.dyn_move_number())
            .field("fingerprint", &self.dyn_fingerprint())
            .finish()
    }
}

impl<B: Board> ErasedBoard for B {
    fn box_clone(&self) -> AnyBoard {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_player_count(&self) -> usize {
        self.player_count()
    }

    fn dyn_current_player(&self) -> PlayerId {
        self.current_player()
    }

    fn dyn_move_number(&self) -> u32 {
        self.move_number()
    }

    fn dyn_execute(&mut self, mv: &Move, mode: ExecuteMode) {
        self.execute(mv, mode);
    }

    fn dyn_unexecute(&mut self, mv: &Move) {
        self.unexecute(mv);
    }

    fn dyn_fingerprint(&self) -> Fingerprint {
        self.fingerprint()
    }

    fn dyn_legal_moves(&self) -> Vec<Move> {
        self.legal_moves()
    }

    fn dyn_game_over(&self) -> bool {
        self.game_over()
    }

    fn dyn_win_for_player(&self, player: PlayerId) -> bool {
        self.win_for_player(player)
    }

    fn dyn_vocabulary(&self) -> &'static Vocabulary {
        self.vocabulary()
    }

    fn dyn_cancels(&self, earlier: &Move, later: &Move) -> bool {
        self.cancels(earlier, later)
    }
}

impl dyn ErasedBoard {
    /// The concrete board, if it is a `B`.
    #[must_use]
    pub fn downcast_ref<B: Board>(&self) -> Option<&B> {
        self.as_any().downcast_ref::<B>()
    }
}

// Every forwarding call goes through `**self` to reach the inner board;
// calling on `self` would resolve to the blanket impl for the box itself.
impl Clone for AnyBoard {
    fn clone(&self) -> Self {
        (**self).box_clone()
    }
}

impl Board for AnyBoard {
    fn player_count(&self) -> usize {
        (**self).dyn_player_count()
    }

    fn current_player(&self) -> PlayerId {
        (**self).dyn_current_player()
    }

    fn move_number(&self) -> u32 {
        (**self).dyn_move_number()
    }

    fn execute(&mut self, mv: &Move, mode: ExecuteMode) {
        (**self).dyn_execute(mv, mode);
    }

    fn unexecute(&mut self, mv: &Move) {
        (**self).dyn_unexecute(mv);
    }

    fn fingerprint(&self) -> Fingerprint {
        (**self).dyn_fingerprint()
    }

    fn legal_moves(&self) -> Vec<Move> {
        (**self).dyn_legal_moves()
    }

    fn game_over(&self) -> bool {
        (**self).dyn_game_over()
    }

    fn win_for_player(&self, player: PlayerId) -> bool {
        (**self).dyn_win_for_player(player)
    }

    fn vocabulary(&self) -> &'static Vocabulary {
        (**self).dyn_vocabulary()
    }

    fn cancels(&self, earlier: &Move, later: &Move) -> bool {
        (**self).dyn_cancels(earlier, later)
    }
}

/// Adapts an evaluator for a concrete board to [`AnyBoard`].
pub struct ErasedEvaluator<B, E> {
    inner: E,
    _board: PhantomData<fn(&B)>,
}

impl<B: Board, E: Evaluator<B>> ErasedEvaluator<B, E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            _board: PhantomData,
        }
    }
}

impl<B: Board, E: Evaluator<B>> Evaluator<AnyBoard> for ErasedEvaluator<B, E> {
    fn evaluate(&self, board: &AnyBoard, player: PlayerId) -> f64 {
        let Some(concrete) = (**board).downcast_ref::<B>() else {
            panic!(
                "evaluator for {} applied to a different board type",
                std::any::type_name::<B>()
            );
        };
        self.inner.evaluate(concrete, player)
    }
}
