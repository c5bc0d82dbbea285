//! Connection game board.

use std::sync::OnceLock;

use crate::core::{Fingerprint, Fingerprinter, GameSetup, Move, OpCode, PlayerId, Vocabulary};
use crate::games::geometry::{SquareGrid, HEX};
use crate::rules::{Board, ExecuteMode, RegistryError};

/// Place a stone: `place <col> <row>`.
pub const PLACE: OpCode = OpCode::game(0);

pub const DEFAULT_SIZE: usize = 6;

const FINGERPRINT_SEED: u64 = 0x636f_6e6e_6563_7401;

/// Contents of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Blocked,
    Stone(PlayerId),
}

impl Cell {
    fn code(self) -> usize {
        match self {
            Cell::Empty => 0,
            Cell::Blocked => 1,
            Cell::Stone(p) => 2 + p.index(),
        }
    }
}

/// Which edges a player joins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    /// Row 0 to the last row.
    TopBottom,
    /// Column A to the last column.
    LeftRight,
}

impl Axis {
    fn of(player: PlayerId) -> Self {
        if player.index() == 0 {
            Axis::TopBottom
        } else {
            Axis::LeftRight
        }
    }
}

/// Two-player Hex-style board on an N x N rhombus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectBoard {
    grid: SquareGrid,
    cells: Vec<Cell>,
    to_move: PlayerId,
    move_number: u32,
    winner: Option<PlayerId>,
}

impl ConnectBoard {
    /// Empty `size` x `size` board, player 0 to move.
    pub fn new(size: usize) -> Self {
        let grid = SquareGrid::square(size);
        Self {
            grid,
            cells: vec![Cell::Empty; grid.len()],
            to_move: PlayerId::new(0),
            move_number: 0,
            winner: None,
        }
    }

    /// Registry constructor.
    pub fn from_setup(setup: &GameSetup) -> Result<Self, RegistryError> {
        if setup.player_count != 2 {
            return Err(RegistryError::UnsupportedSetup {
                game: setup.game_id.clone(),
                reason: format!("{} players, need exactly 2", setup.player_count),
            });
        }
        Ok(Self::new(DEFAULT_SIZE))
    }

    /// Build a position from text rows: `.` empty, `#` blocked, `X` player 0,
    /// `O` player 1. Whitespace inside a row is ignored.
    pub fn from_rows(rows: &[&str], to_move: PlayerId) -> Self {
        let size = rows.len();
        let mut board = Self::new(size);
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            assert_eq!(cells.len(), size, "row {row} must have {size} cells");
            for (col, ch) in cells.into_iter().enumerate() {
                let idx = board.grid.index(col, row);
                board.cells[idx] = match ch {
                    '.' => Cell::Empty,
                    '#' => Cell::Blocked,
                    'X' => Cell::Stone(PlayerId::new(0)),
                    'O' => Cell::Stone(PlayerId::new(1)),
                    other => panic!("unknown cell character '{other}'"),
                };
            }
        }
        board.to_move = to_move;
        board.winner = PlayerId::all(2).find(|&p| board.connected(p));
        board
    }

    /// Mark a cell unusable. Only valid before the first move.
    #[must_use]
    pub fn with_blocked(mut self, cells: &[(usize, usize)]) -> Self {
        assert_eq!(self.move_number, 0, "cells can only be blocked at setup");
        for &(col, row) in cells {
            let idx = self.grid.index(col, row);
            self.cells[idx] = Cell::Blocked;
        }
        self
    }

    #[must_use]
    pub fn grid(&self) -> SquareGrid {
        self.grid
    }

    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> Cell {
        self.cells[self.grid.index(col, row)]
    }

    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The `place` move for `(col, row)` by the side to move.
    #[must_use]
    pub fn place(&self, col: usize, row: usize) -> Move {
        Move::new(PLACE).at(col, row).by(self.to_move)
    }

    fn target_index(&self, mv: &Move) -> usize {
        assert_eq!(mv.op, PLACE, "connect has no move {:?}", mv.op);
        let Some((col, row)) = mv.cell() else {
            panic!("place move without a cell: {mv:?}");
        };
        assert!(
            col < self.grid.width() && row < self.grid.height(),
            "place outside the board: {mv:?}"
        );
        self.grid.index(col, row)
    }

    /// Whether `player` has a chain joining their two edges.
    ///
    /// Flood fill over an explicit work list from every own stone on the
    /// starting edge.
    #[must_use]
    pub fn connected(&self, player: PlayerId) -> bool {
        let axis = Axis::of(player);
        let n = self.grid.width();
        let starts: Vec<usize> = (0..n)
            .map(|i| match axis {
                Axis::TopBottom => self.grid.index(i, 0),
                Axis::LeftRight => self.grid.index(0, i),
            })
            .filter(|&idx| self.cells[idx] == Cell::Stone(player))
            .collect();

        let mut seen = vec![false; self.cells.len()];
        let mut work = starts;
        for &idx in &work {
            seen[idx] = true;
        }

        while let Some(idx) = work.pop() {
            let (col, row) = self.grid.coords(idx);
            let reached = match axis {
                Axis::TopBottom => row == n - 1,
                Axis::LeftRight => col == n - 1,
            };
            if reached {
                return true;
            }
            for next in self.grid.neighbors(idx, &HEX) {
                if !seen[next] && self.cells[next] == Cell::Stone(player) {
                    seen[next] = true;
                    work.push(next);
                }
            }
        }
        false
    }

    fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Empty)
            .map(|(i, _)| i)
    }
}

fn vocabulary() -> &'static Vocabulary {
    static VOCAB: OnceLock<Vocabulary> = OnceLock::new();
    VOCAB.get_or_init(|| Vocabulary::new(&[(PLACE, "place")]))
}

impl Board for ConnectBoard {
    fn player_count(&self) -> usize {
        2
    }

    fn current_player(&self) -> PlayerId {
        self.to_move
    }

    fn move_number(&self) -> u32 {
        self.move_number
    }

    fn execute(&mut self, mv: &Move, _mode: ExecuteMode) {
        assert!(self.winner.is_none(), "move {mv:?} after the game ended");
        let idx = self.target_index(mv);
        assert_eq!(self.cells[idx], Cell::Empty, "place on occupied cell: {mv:?}");

        let mover = self.to_move;
        self.cells[idx] = Cell::Stone(mover);
        self.move_number += 1;
        self.to_move = mover.next(2);
        if self.connected(mover) {
            self.winner = Some(mover);
        }
    }

    fn unexecute(&mut self, mv: &Move) {
        let idx = self.target_index(mv);
        let mover = self.to_move.next(2);
        assert_eq!(
            self.cells[idx],
            Cell::Stone(mover),
            "unexecute of {mv:?} does not match the last move"
        );
        assert!(self.move_number > 0, "unexecute with no moves played");

        self.cells[idx] = Cell::Empty;
        self.move_number -= 1;
        self.to_move = mover;
        self.winner = None;
    }

    fn fingerprint(&self) -> Fingerprint {
        let mut fp = Fingerprinter::new(FINGERPRINT_SEED);
        for cell in &self.cells {
            fp.cell(4, cell.code());
        }
        fp.player(self.to_move, 2);
        fp.finish()
    }

    fn legal_moves(&self) -> Vec<Move> {
        if self.game_over() {
            return Vec::new();
        }
        self.empty_cells()
            .map(|idx| {
                let (col, row) = self.grid.coords(idx);
                self.place(col, row)
            })
            .collect()
    }

    fn game_over(&self) -> bool {
        self.winner.is_some() || self.empty_cells().next().is_none()
    }

    fn win_for_player(&self, player: PlayerId) -> bool {
        self.winner == Some(player)
    }

    fn vocabulary(&self) -> &'static Vocabulary {
        vocabulary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::GameResult;

    const P0: PlayerId = PlayerId::new(0);
    const P1: PlayerId = PlayerId::new(1);

    #[test]
    fn test_new_board() {
        let board = ConnectBoard::new(4);
        assert_eq!(board.legal_moves().len(), 16);
        assert_eq!(board.current_player(), P0);
        assert!(!board.game_over());
    }

    #[test]
    fn test_execute_unexecute_restores_fingerprint() {
        let mut board = ConnectBoard::new(4);
        let before = board.fingerprint();
        let mv = board.place(2, 1);

        board.execute(&mv, ExecuteMode::Search);
        assert_ne!(board.fingerprint(), before);
        assert_eq!(board.current_player(), P1);

        board.unexecute(&mv);
        assert_eq!(board.fingerprint(), before);
        assert_eq!(board, ConnectBoard::new(4));
    }

    #[test]
    fn test_top_bottom_win() {
        let mut board = ConnectBoard::from_rows(
            &["X . .", "X O O", ". . ."],
            P0,
        );
        assert!(!board.game_over());

        let mv = board.place(0, 2);
        board.execute(&mv, ExecuteMode::Live);
        assert!(board.game_over());
        assert!(board.win_for_player(P0));
        assert_eq!(board.result(), Some(GameResult::Winner(P0)));
        assert!(board.legal_moves().is_empty());

        board.unexecute(&mv);
        assert!(!board.game_over());
    }

    #[test]
    fn test_left_right_win_uses_hex_diagonal() {
        // O at (0,1) and (1,0) are hex neighbours; (2,0) finishes the edge.
        let board = ConnectBoard::from_rows(&[". O O", "O X .", "X X ."], P0);
        assert!(board.connected(P1));
        assert!(!board.connected(P0));
    }

    #[test]
    fn test_blocked_cells_are_not_legal() {
        let board = ConnectBoard::new(3).with_blocked(&[(1, 1)]);
        assert_eq!(board.legal_moves().len(), 8);
        assert!(!board.is_legal(&board.place(1, 1)));
    }

    #[test]
    fn test_full_board_without_winner_is_draw() {
        let board = ConnectBoard::from_rows(&["X #", "# O"], P0);
        assert!(board.game_over());
        assert_eq!(board.result(), Some(GameResult::Draw));
    }

    #[test]
    #[should_panic(expected = "occupied")]
    fn test_place_on_occupied_panics() {
        let mut board = ConnectBoard::new(3);
        let mv = board.place(0, 0);
        board.execute(&mv, ExecuteMode::Live);
        let again = Move::new(PLACE).at(0, 0).by(P1);
        board.execute(&again, ExecuteMode::Live);
    }

    #[test]
    fn test_wire_round_trip() {
        let board = ConnectBoard::new(6);
        let mv = board.place(3, 5);
        let text = board.encode_move(&mv).unwrap();
        assert_eq!(text, "place D 5 P0");
        assert_eq!(board.decode_move(&text).unwrap(), mv);
    }
}
