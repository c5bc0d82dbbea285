//! Distance-to-connect evaluation.

use std::collections::VecDeque;

use crate::core::PlayerId;
use crate::games::geometry::HEX;
use crate::rules::{bounded, Board, Evaluator};

use super::game::{Cell, ConnectBoard};

const STEP_VALUE: f64 = 100.0;

/// Scores a position by how many empty cells each side still needs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectEvaluator;

impl ConnectEvaluator {
    /// Fewest empty cells `player` must fill to connect, or `None` if cut off.
    ///
    /// 0-1 breadth-first search: own stones cost nothing, empty cells cost one.
    #[must_use]
    pub fn distance(board: &ConnectBoard, player: PlayerId) -> Option<u32> {
        let grid = board.grid();
        let n = grid.width();
        let cells = board.cells();
        let cost = |idx: usize| match cells[idx] {
            Cell::Stone(p) if p == player => Some(0),
            Cell::Empty => Some(1),
            _ => None,
        };
        let top_bottom = player.index() == 0;

        let mut dist = vec![u32::MAX; cells.len()];
        let mut queue = VecDeque::new();
        for i in 0..n {
            let idx = if top_bottom { grid.index(i, 0) } else { grid.index(0, i) };
            if let Some(c) = cost(idx) {
                dist[idx] = c;
                if c == 0 {
                    queue.push_front(idx);
                } else {
                    queue.push_back(idx);
                }
            }
        }

        let mut best: Option<u32> = None;
        while let Some(idx) = queue.pop_front() {
            let d = dist[idx];
            let (col, row) = grid.coords(idx);
            if (top_bottom && row == n - 1) || (!top_bottom && col == n - 1) {
                best = Some(best.map_or(d, |b| b.min(d)));
            }
            for next in grid.neighbors(idx, &HEX) {
                let Some(c) = cost(next) else { continue };
                if d + c < dist[next] {
                    dist[next] = d + c;
                    if c == 0 {
                        queue.push_front(next);
                    } else {
                        queue.push_back(next);
                    }
                }
            }
        }
        best
    }
}

impl Evaluator<ConnectBoard> for ConnectEvaluator {
    fn evaluate(&self, board: &ConnectBoard, player: PlayerId) -> f64 {
        let opponent = player.next(board.player_count());
        // A side that is cut off counts as one step past the longest path.
        let cutoff = board.cells().len() as u32 + 1;
        let mine = Self::distance(board, player).unwrap_or(cutoff);
        let theirs = Self::distance(board, opponent).unwrap_or(cutoff);
        bounded((f64::from(theirs) - f64::from(mine)) * STEP_VALUE)
    }
}
