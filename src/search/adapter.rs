//! Bridge between a board clone and the search drivers.
//!
//! The adapter owns the board being searched and a stack of the moves made
//! on it. Every `make` is in `ExecuteMode::Search`; every `unmake` pops the
//! stack and calls `unexecute`. With verification on, each unmake checks
//! that the fingerprint, side to move and move number are back to what they
//! were before the matching make.

use crate::core::{Fingerprint, Move, PlayerId};
use crate::history::Checkpoint;
use crate::rules::{Board, ExecuteMode};

/// Search-side owner of a board.
#[derive(Clone, Debug)]
pub struct SearchAdapter<B: Board> {
    board: B,
    stack: Vec<(Move, Option<Checkpoint>)>,
    verify_unmove: bool,
}

impl<B: Board> SearchAdapter<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            stack: Vec::with_capacity(64),
            verify_unmove: false,
        }
    }

    /// Check every unmake against the state before its make.
    #[must_use]
    pub fn with_verification(mut self, on: bool) -> Self {
        self.verify_unmove = on;
        self
    }

    pub fn make(&mut self, mv: &Move) {
        let before = self.verify_unmove.then(|| Checkpoint::of(&self.board));
        self.board.execute(mv, ExecuteMode::Search);
        self.stack.push((mv.clone(), before));
    }

    /// Undo the most recent `make`.
    ///
    /// # Panics
    ///
    /// With an empty move stack, or when verification is on and the board
    /// did not return to its earlier state.
    pub fn unmake(&mut self) -> Move {
        let Some((mv, before)) = self.stack.pop() else {
            panic!("unmake with an empty move stack");
        };
        self.board.unexecute(&mv);
        if let Some(before) = before {
            let after = Checkpoint::of(&self.board);
            assert_eq!(
                after,
                before,
                "unexecute of {} did not restore the board",
                self.board.describe_move(&mv)
            );
        }
        mv
    }

    /// Undo every outstanding move.
    pub fn unwind(&mut self) {
        while !self.stack.is_empty() {
            self.unmake();
        }
    }

    /// Moves made since the adapter was created.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn board(&self) -> &B {
        &self.board
    }

    #[must_use]
    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.legal_moves()
    }

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.board.current_player()
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.board.fingerprint()
    }

    #[must_use]
    pub fn game_over(&self) -> bool {
        self.board.game_over()
    }

    /// Give the board back, unwinding first.
    pub fn into_board(mut self) -> B {
        self.unwind();
        self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect::ConnectBoard;
    use crate::games::stones::StonesBoard;

    #[test]
    fn test_make_unmake_round_trip() {
        let board = StonesBoard::new(4);
        let start = board.fingerprint();
        let mut adapter = SearchAdapter::new(board).with_verification(true);

        let first = adapter.legal_moves()[0].clone();
        adapter.make(&first);
        let second = adapter.legal_moves()[0].clone();
        adapter.make(&second);
        assert_eq!(adapter.depth(), 2);

        assert_eq!(adapter.unmake(), second);
        assert_eq!(adapter.unmake(), first);
        assert_eq!(adapter.fingerprint(), start);
    }

    #[test]
    fn test_into_board_unwinds() {
        let board = ConnectBoard::new(3);
        let mut adapter = SearchAdapter::new(board.clone());
        for mv in board.legal_moves().iter().take(3) {
            adapter.make(mv);
        }
        assert_eq!(adapter.into_board(), board);
    }

    #[test]
    #[should_panic(expected = "unmake with an empty move stack")]
    fn test_unmake_empty_panics() {
        let mut adapter = SearchAdapter::new(ConnectBoard::new(3));
        adapter.unmake();
    }
}
