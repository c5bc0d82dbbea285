//! Capture game board.

use std::sync::OnceLock;

use crate::core::{Fingerprint, Fingerprinter, GameSetup, Move, OpCode, PlayerId, PlayerMap, Vocabulary};
use crate::games::geometry::{SquareGrid, ORTHOGONAL};
use crate::rules::{Board, ExecuteMode, RegistryError};

use super::phase::{Phase, Step};

pub const PLACE: OpCode = OpCode::game(0);
pub const CAPTURE: OpCode = OpCode::game(1);
pub const PICK: OpCode = OpCode::game(2);
pub const DROP: OpCode = OpCode::game(3);

pub const DEFAULT_SIZE: usize = 5;
pub const DEFAULT_CAPTURE_TARGET: u32 = 3;

const FINGERPRINT_SEED: u64 = 0x7374_6f6e_6573_0001;

/// State restored by `unexecute`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Undo {
    phase: Phase,
    to_move: PlayerId,
    move_number: u32,
    passes: u8,
}

/// Two-player capture game on an N x N square grid.
///
/// A turn is one of:
/// - `place`: put a stone on an empty cell
/// - `capture`: remove an enemy stone orthogonally next to one of yours
/// - `pick` then `drop`: slide one of your stones to an empty neighbour
/// - `pass`
///
/// Dropping a picked stone back where it came from takes the pick back and
/// the turn continues. The game ends when a player reaches the capture target
/// or after two passes in a row, in which case more captures wins.
#[derive(Clone, Debug)]
pub struct StonesBoard {
    grid: SquareGrid,
    cells: Vec<Option<PlayerId>>,
    captures: PlayerMap<u32>,
    phase: Phase,
    to_move: PlayerId,
    move_number: u32,
    passes: u8,
    capture_target: u32,
    undo: Vec<Undo>,
}

impl StonesBoard {
    pub fn new(size: usize) -> Self {
        let grid = SquareGrid::square(size);
        Self {
            grid,
            cells: vec![None; grid.len()],
            captures: PlayerMap::with_value(2, 0),
            phase: Phase::Play,
            to_move: PlayerId::new(0),
            move_number: 0,
            passes: 0,
            capture_target: DEFAULT_CAPTURE_TARGET,
            undo: Vec::new(),
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

    #[must_use]
    pub fn with_capture_target(mut self, target: u32) -> Self {
        assert!(target > 0, "capture target must be positive");
        self.capture_target = target;
        self
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn captures(&self, player: PlayerId) -> u32 {
        self.captures[player]
    }

    #[must_use]
    pub fn stone(&self, col: usize, row: usize) -> Option<PlayerId> {
        self.cells[self.grid.index(col, row)]
    }

    /// Stones on the board for `player`.
    #[must_use]
    pub fn stone_count(&self, player: PlayerId) -> usize {
        self.cells.iter().filter(|c| **c == Some(player)).count()
    }

    pub fn place(&self, col: usize, row: usize) -> Move {
        Move::new(PLACE).at(col, row).by(self.to_move)
    }

    pub fn capture(&self, col: usize, row: usize) -> Move {
        Move::new(CAPTURE).at(col, row).by(self.to_move)
    }

    pub fn pick(&self, col: usize, row: usize) -> Move {
        Move::new(PICK).at(col, row).by(self.to_move)
    }

    pub fn drop_at(&self, col: usize, row: usize) -> Move {
        Move::new(DROP).at(col, row).by(self.to_move)
    }

    pub fn pass(&self) -> Move {
        Move::pass(self.to_move)
    }

    fn opponent(player: PlayerId) -> PlayerId {
        player.next(2)
    }

    fn target_index(&self, mv: &Move) -> usize {
        let Some((col, row)) = mv.cell() else {
            panic!("{mv:?} needs a cell");
        };
        assert!(
            col < self.grid.width() && row < self.grid.height(),
            "{mv:?} is outside the board"
        );
        self.grid.index(col, row)
    }

    fn has_empty_neighbor(&self, idx: usize) -> bool {
        self.grid
            .neighbors(idx, &ORTHOGONAL)
            .any(|n| self.cells[n].is_none())
    }

    fn can_capture(&self, idx: usize, mover: PlayerId) -> bool {
        self.cells[idx] == Some(Self::opponent(mover))
            && self
                .grid
                .neighbors(idx, &ORTHOGONAL)
                .any(|n| self.cells[n] == Some(mover))
    }

    fn move_at(&self, op: OpCode, idx: usize) -> Move {
        let (col, row) = self.grid.coords(idx);
        Move::new(op).at(col, row).by(self.to_move)
    }

    fn apply(&mut self, mv: &Move, mover: PlayerId) -> Step {
        match (mv.op, self.phase) {
            (PLACE, Phase::Play) => {
                let idx = self.target_index(mv);
                assert!(self.cells[idx].is_none(), "place on occupied cell: {mv:?}");
                self.cells[idx] = Some(mover);
                self.passes = 0;
                Step::EndTurn
            }
            (CAPTURE, Phase::Play) => {
                let idx = self.target_index(mv);
                assert!(self.can_capture(idx, mover), "illegal capture: {mv:?}");
                self.cells[idx] = None;
                self.captures[mover] += 1;
                self.passes = 0;
                if self.captures[mover] >= self.capture_target {
                    Step::Finish
                } else {
                    Step::EndTurn
                }
            }
            (PICK, Phase::Play) => {
                let idx = self.target_index(mv);
                assert_eq!(self.cells[idx], Some(mover), "pick of a foreign stone: {mv:?}");
                assert!(self.has_empty_neighbor(idx), "picked stone cannot move: {mv:?}");
                self.cells[idx] = None;
                Step::Pick(idx)
            }
            (DROP, Phase::Holding { from }) => {
                let idx = self.target_index(mv);
                assert!(self.cells[idx].is_none(), "drop on occupied cell: {mv:?}");
                self.cells[idx] = Some(mover);
                if idx == from {
                    Step::DropBack
                } else {
                    assert!(
                        self.grid.is_adjacent(from, idx, &ORTHOGONAL),
                        "drop is not next to the pick: {mv:?}"
                    );
                    self.passes = 0;
                    Step::EndTurn
                }
            }
            (OpCode::PASS, Phase::Play) => {
                self.passes += 1;
                if self.passes >= 2 {
                    Step::Finish
                } else {
                    Step::EndTurn
                }
            }
            (op, phase) => panic!("move {op:?} is not allowed in phase {phase:?}"),
        }
    }
}

fn vocabulary() -> &'static Vocabulary {
    static VOCAB: OnceLock<Vocabulary> = OnceLock::new();
    VOCAB.get_or_init(|| {
        Vocabulary::new(&[
            (PLACE, "place"),
            (CAPTURE, "capture"),
            (PICK, "pick"),
            (DROP, "drop"),
        ])
    })
}

impl Board for StonesBoard {
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
        let mover = self.to_move;
        if let Some(p) = mv.player {
            assert_eq!(p, mover, "{mv:?} played out of turn");
        }

        let saved = Undo {
            phase: self.phase,
            to_move: self.to_move,
            move_number: self.move_number,
            passes: self.passes,
        };

        let step = self.apply(mv, mover);
        self.phase = self.phase.after(step);
        if matches!(step, Step::EndTurn | Step::Finish) {
            self.move_number += 1;
            self.to_move = Self::opponent(mover);
        }
        self.undo.push(saved);
    }

    fn unexecute(&mut self, mv: &Move) {
        let Some(saved) = self.undo.pop() else {
            panic!("unexecute of {mv:?} with no matching execute");
        };
        let mover = saved.to_move;
        let idx = self.target_index_or_none(mv);

        match mv.op {
            PLACE | DROP => {
                let idx = idx.unwrap_or_else(|| panic!("{mv:?} needs a cell"));
                assert_eq!(self.cells[idx], Some(mover), "unexecute of {mv:?} does not match");
                self.cells[idx] = None;
            }
            CAPTURE => {
                let idx = idx.unwrap_or_else(|| panic!("{mv:?} needs a cell"));
                self.cells[idx] = Some(Self::opponent(mover));
                self.captures[mover] -= 1;
            }
            PICK => {
                let idx = idx.unwrap_or_else(|| panic!("{mv:?} needs a cell"));
                self.cells[idx] = Some(mover);
            }
            OpCode::PASS => {}
            op => panic!("unexecute of unknown move {op:?}"),
        }

        self.phase = saved.phase;
        self.to_move = saved.to_move;
        self.move_number = saved.move_number;
        self.passes = saved.passes;
    }

    fn fingerprint(&self) -> Fingerprint {
        let mut fp = Fingerprinter::new(FINGERPRINT_SEED);
        for cell in &self.cells {
            fp.cell(3, cell.map_or(0, |p| 1 + p.index()));
        }
        for (_, &n) in self.captures.iter() {
            fp.count(u64::from(n));
        }
        fp.cell(3, self.phase.code());
        match self.phase {
            Phase::Holding { from } => fp.stack(&[from as u64]),
            _ => fp.stack(&[]),
        };
        fp.count(u64::from(self.passes));
        fp.player(self.to_move, 2);
        fp.finish()
    }

    fn legal_moves(&self) -> Vec<Move> {
        let mover = self.to_move;
        match self.phase {
            Phase::GameOver => Vec::new(),
            Phase::Holding { from } => {
                let mut moves = vec![self.move_at(DROP, from)];
                moves.extend(
                    self.grid
                        .neighbors(from, &ORTHOGONAL)
                        .filter(|&n| self.cells[n].is_none())
                        .map(|n| self.move_at(DROP, n)),
                );
                moves
            }
            Phase::Play => {
                let mut moves = Vec::new();
                for idx in 0..self.cells.len() {
                    if self.cells[idx].is_none() {
                        moves.push(self.move_at(PLACE, idx));
                    }
                }
                for idx in 0..self.cells.len() {
                    if self.can_capture(idx, mover) {
                        moves.push(self.move_at(CAPTURE, idx));
                    }
                }
                for idx in 0..self.cells.len() {
                    if self.cells[idx] == Some(mover) && self.has_empty_neighbor(idx) {
                        moves.push(self.move_at(PICK, idx));
                    }
                }
                moves.push(self.pass());
                moves
            }
        }
    }

    fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    fn win_for_player(&self, player: PlayerId) -> bool {
        if !self.game_over() {
            return false;
        }
        let mine = self.captures[player];
        mine >= self.capture_target
            || (self.passes >= 2 && mine > self.captures[Self::opponent(player)])
    }

    fn vocabulary(&self) -> &'static Vocabulary {
        vocabulary()
    }

    fn cancels(&self, earlier: &Move, later: &Move) -> bool {
        earlier.op == PICK && later.op == DROP && earlier.cell() == later.cell()
    }
}

impl StonesBoard {
    fn target_index_or_none(&self, mv: &Move) -> Option<usize> {
        mv.cell()
            .filter(|&(c, r)| c < self.grid.width() && r < self.grid.height())
            .map(|(c, r)| self.grid.index(c, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::GameResult;

    const P0: PlayerId = PlayerId::new(0);
    const P1: PlayerId = PlayerId::new(1);

    fn play(board: &mut StonesBoard, mv: Move) {
        assert!(board.is_legal(&mv), "{mv:?} should be legal");
        board.execute(&mv, ExecuteMode::Live);
    }

    #[test]
    fn test_place_place_capture_pass() {
        let mut board = StonesBoard::new(5);
        let mv = board.place(1, 2);
        play(&mut board, mv);
        let mv = board.place(1, 3);
        play(&mut board, mv);
        let mv = board.capture(1, 3);
        play(&mut board, mv);
        let mv = board.pass();
        play(&mut board, mv);

        assert_eq!(board.captures(P0), 1);
        assert_eq!(board.stone(1, 3), None);
        assert_eq!(board.move_number(), 4);
        assert_eq!(board.current_player(), P0);
    }

    #[test]
    fn test_pick_and_drop_back_restores_state() {
        let mut board = StonesBoard::new(3);
        let mv = board.place(1, 1);
        play(&mut board, mv);
        let mv = board.pass();
        play(&mut board, mv);
        let before = board.fingerprint();

        let mv = board.pick(1, 1);
        play(&mut board, mv);
        assert_eq!(board.phase(), Phase::Holding { from: 4 });
        assert_eq!(board.current_player(), P0);

        let mv = board.drop_at(1, 1);
        play(&mut board, mv);
        assert_eq!(board.fingerprint(), before);
        assert_eq!(board.phase(), Phase::Play);
        assert_eq!(board.move_number(), 2);
    }

    #[test]
    fn test_pick_and_drop_elsewhere_ends_turn() {
        let mut board = StonesBoard::new(3);
        let mv = board.place(0, 0);
        play(&mut board, mv);
        let mv = board.pass();
        play(&mut board, mv);
        let mv = board.pick(0, 0);
        play(&mut board, mv);

        let drops = board.legal_moves();
        assert_eq!(drops.len(), 3);
        assert_eq!(drops[0], board.drop_at(0, 0));

        let mv = board.drop_at(1, 0);
        play(&mut board, mv);
        assert_eq!(board.stone(1, 0), Some(P0));
        assert_eq!(board.stone(0, 0), None);
        assert_eq!(board.current_player(), P1);
    }

    #[test]
    fn test_unexecute_every_legal_move() {
        let mut board = StonesBoard::new(3);
        let mv = board.place(1, 1);
        play(&mut board, mv);
        let mv = board.place(1, 0);
        play(&mut board, mv);
        let before = board.fingerprint();

        for mv in board.legal_moves() {
            board.execute(&mv, ExecuteMode::Search);
            board.unexecute(&mv);
            assert_eq!(board.fingerprint(), before, "asymmetric {mv:?}");
        }
    }

    #[test]
    fn test_capture_target_ends_game() {
        let mut board = StonesBoard::new(3).with_capture_target(1);
        let mv = board.place(0, 0);
        play(&mut board, mv);
        let mv = board.place(1, 0);
        play(&mut board, mv);
        let mv = board.capture(1, 0);
        play(&mut board, mv);

        assert!(board.game_over());
        assert_eq!(board.result(), Some(GameResult::Winner(P0)));
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_two_passes_draw() {
        let mut board = StonesBoard::new(3);
        let mv = board.pass();
        play(&mut board, mv);
        let mv = board.pass();
        play(&mut board, mv);
        assert!(board.game_over());
        assert_eq!(board.result(), Some(GameResult::Draw));
    }

    #[test]
    fn test_cancels_only_same_cell() {
        let board = StonesBoard::new(3);
        let pick = Move::new(PICK).at(0, 0).by(P0);
        assert!(board.cancels(&pick, &Move::new(DROP).at(0, 0).by(P0)));
        assert!(!board.cancels(&pick, &Move::new(DROP).at(1, 0).by(P0)));
        assert!(!board.cancels(&Move::new(PLACE).at(0, 0), &Move::new(DROP).at(0, 0)));
    }

    #[test]
    #[should_panic(expected = "out of turn")]
    fn test_wrong_player_panics() {
        let mut board = StonesBoard::new(3);
        board.execute(&Move::new(PLACE).at(0, 0).by(P1), ExecuteMode::Live);
    }
}
