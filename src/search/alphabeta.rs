//! Alpha-beta driver for games with a variable number of moves per turn.
//!
//! Scores are negamax from the point of view of the side to move, but the
//! sign flips only where the mover actually changes: a multi-step turn keeps
//! the same window across its steps.
//!
//! The top-level choice may be randomized among the moves scoring within a
//! margin of the best. A decisive best score turns the margin off, so a
//! found win is never traded for a merely good move.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{GameRng, Move, PlayerId};
use crate::rules::{bounded, is_decisive, Board, Evaluator, VALUE_OF_WIN};

use super::adapter::SearchAdapter;
use super::budget::Limits;

const INFINITY: f64 = f64::INFINITY;

/// Deadline is polled once per this many nodes.
const DEADLINE_POLL: u64 = 256;

/// How deep to look.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthPolicy {
    /// Individual moves.
    Plies(u32),
    /// Changes of the side to move.
    Turns(u32),
}

impl DepthPolicy {
    #[must_use]
    pub fn depth(self) -> u32 {
        match self {
            DepthPolicy::Plies(n) | DepthPolicy::Turns(n) => n,
        }
    }

    /// Same policy with a different depth.
    #[must_use]
    pub fn with_depth(self, depth: u32) -> Self {
        match self {
            DepthPolicy::Plies(_) => DepthPolicy::Plies(depth),
            DepthPolicy::Turns(_) => DepthPolicy::Turns(depth),
        }
    }
}

/// Alpha-beta configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBetaConfig {
    pub depth: DepthPolicy,

    /// Try the last two cutoff moves of each ply first.
    pub killers: bool,

    /// Top-level moves scoring within this margin of the best are equally
    /// likely to be played. Zero always plays the first best move.
    pub randomization: f64,

    /// Search depth 1, 2, ... up to `depth`, keeping the last completed
    /// iteration when the budget runs out.
    pub iterative: bool,

    /// Check every unexecute against the state before its execute.
    pub verify_unmove: bool,

    /// Ply cap per turn under `DepthPolicy::Turns`.
    pub max_moves_per_turn: u32,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            depth: DepthPolicy::Plies(4),
            killers: true,
            randomization: 0.0,
            iterative: true,
            verify_unmove: false,
            max_moves_per_turn: 4,
        }
    }
}

impl AlphaBetaConfig {
    #[must_use]
    pub fn with_depth(mut self, depth: DepthPolicy) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_killers(mut self, on: bool) -> Self {
        self.killers = on;
        self
    }

    #[must_use]
    pub fn with_randomization(mut self, margin: f64) -> Self {
        self.randomization = margin.max(0.0);
        self
    }

    #[must_use]
    pub fn with_iterative(mut self, on: bool) -> Self {
        self.iterative = on;
        self
    }

    #[must_use]
    pub fn with_verification(mut self, on: bool) -> Self {
        self.verify_unmove = on;
        self
    }

    #[must_use]
    pub fn with_max_moves_per_turn(mut self, n: u32) -> Self {
        self.max_moves_per_turn = n.max(1);
        self
    }
}

/// Outcome of one alpha-beta decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlphaBetaResult {
    pub mv: Move,
    /// Score of `mv` for the side to move at the root.
    pub score: f64,
    /// Deepest completed iteration (0 if none completed).
    pub depth: u32,
    pub nodes: u64,
    /// Moves the final choice was drawn from.
    pub candidates: usize,
    /// The budget or a cancel cut the search short.
    pub aborted: bool,
}

/// Plies and turns left below a node.
#[derive(Clone, Copy, Debug)]
struct Horizon {
    plies: u32,
    turns: Option<u32>,
}

impl Horizon {
    fn new(policy: DepthPolicy, max_moves_per_turn: u32) -> Self {
        match policy {
            DepthPolicy::Plies(n) => Self {
                plies: n,
                turns: None,
            },
            DepthPolicy::Turns(n) => Self {
                plies: n.saturating_mul(max_moves_per_turn),
                turns: Some(n),
            },
        }
    }

    fn reached(self) -> bool {
        self.plies == 0 || self.turns == Some(0)
    }

    fn after(self, turn_ended: bool) -> Self {
        Self {
            plies: self.plies.saturating_sub(1),
            turns: self
                .turns
                .map(|t| if turn_ended { t.saturating_sub(1) } else { t }),
        }
    }
}

/// One alpha-beta decision.
pub struct AlphaBeta<'a, E: ?Sized> {
    config: &'a AlphaBetaConfig,
    evaluator: &'a E,
    limits: Limits,
    rng: GameRng,
    killers: Vec<[Option<Move>; 2]>,
    nodes: u64,
    aborted: bool,
}

impl<'a, E: ?Sized> AlphaBeta<'a, E> {
    pub fn new(config: &'a AlphaBetaConfig, evaluator: &'a E, limits: Limits, rng: GameRng) -> Self {
        Self {
            config,
            evaluator,
            limits,
            rng,
            killers: Vec::new(),
            nodes: 0,
            aborted: false,
        }
    }

    /// Choose a move for the side to move on `board`.
    ///
    /// # Panics
    ///
    /// If `board` has no legal moves.
    pub fn search<B: Board>(&mut self, board: B) -> AlphaBetaResult
    where
        E: Evaluator<B>,
    {
        let mut adapter = SearchAdapter::new(board).with_verification(self.config.verify_unmove);
        let mut root_moves = adapter.legal_moves();
        assert!(!root_moves.is_empty(), "alpha-beta root has no legal moves");

        let target = self.config.depth.depth().max(1);
        let first_depth = if self.config.iterative { 1 } else { target };

        let mut completed: Option<(u32, Vec<(Move, f64)>)> = None;
        let mut partial: Vec<(Move, f64)> = Vec::new();

        for depth in first_depth..=target {
            let horizon = Horizon::new(self.config.depth.with_depth(depth), self.config.max_moves_per_turn);
            let scored = self.search_root(&mut adapter, &root_moves, horizon);
            if self.aborted {
                partial = scored;
                break;
            }

            // Next iteration looks at the best moves first.
            let mut order = scored.clone();
            order.sort_by(|a, b| b.1.total_cmp(&a.1));
            root_moves = order.iter().map(|(m, _)| m.clone()).collect();

            let decided = order.first().is_some_and(|(_, s)| is_decisive(*s));
            completed = Some((depth, scored));
            if decided {
                break;
            }
        }

        let (depth, scored) = match completed {
            Some(done) => done,
            None if !partial.is_empty() => (0, partial),
            None => (0, vec![(root_moves[0].clone(), 0.0)]),
        };

        let (mv, score, candidates) = self.choose(&scored);
        debug!(
            depth,
            nodes = self.nodes,
            score,
            candidates,
            aborted = self.aborted,
            "Alpha-beta search finished"
        );

        AlphaBetaResult {
            mv,
            score,
            depth,
            nodes: self.nodes,
            candidates,
            aborted: self.aborted,
        }
    }

    /// Score every root move. On abort, returns only the moves whose score
    /// was fully established.
    fn search_root<B: Board>(
        &mut self,
        adapter: &mut SearchAdapter<B>,
        moves: &[Move],
        horizon: Horizon,
    ) -> Vec<(Move, f64)>
    where
        E: Evaluator<B>,
    {
        let mover = adapter.current_player();
        let margin = self.config.randomization;
        let mut best = -INFINITY;
        let mut scored = Vec::with_capacity(moves.len());

        for mv in moves {
            // Moves inside the margin need exact scores, so the window opens
            // below the best by the margin.
            let alpha = if margin > 0.0 && !is_decisive(best) {
                best - margin - 1e-9
            } else {
                best
            };
            let score = self.child_score(adapter, mv, mover, horizon, 0, alpha, INFINITY);
            if self.aborted {
                break;
            }
            best = best.max(score);
            scored.push((mv.clone(), score));
        }
        scored
    }

    /// Make `mv`, score the child from `mover`'s side, unmake.
    #[allow(clippy::too_many_arguments)]
    fn child_score<B: Board>(
        &mut self,
        adapter: &mut SearchAdapter<B>,
        mv: &Move,
        mover: PlayerId,
        horizon: Horizon,
        ply: u32,
        alpha: f64,
        beta: f64,
    ) -> f64
    where
        E: Evaluator<B>,
    {
        adapter.make(mv);
        let next = adapter.current_player();
        let turn_ended = next != mover;
        let child = horizon.after(turn_ended);
        let score = if turn_ended {
            -self.negamax(adapter, child, ply + 1, -beta, -alpha)
        } else {
            self.negamax(adapter, child, ply + 1, alpha, beta)
        };
        adapter.unmake();
        score
    }

    fn negamax<B: Board>(
        &mut self,
        adapter: &mut SearchAdapter<B>,
        horizon: Horizon,
        ply: u32,
        mut alpha: f64,
        beta: f64,
    ) -> f64
    where
        E: Evaluator<B>,
    {
        self.nodes += 1;
        if self.out_of_budget() {
            return 0.0;
        }

        let board = adapter.board();
        let mover = board.current_player();
        if board.game_over() {
            return terminal_score(board, mover, ply);
        }
        if horizon.reached() {
            return bounded(self.evaluator.evaluate(board, mover));
        }

        let mut moves = board.legal_moves();
        if moves.is_empty() {
            return bounded(self.evaluator.evaluate(board, mover));
        }
        self.order_killers(&mut moves, ply);

        let mut best = -INFINITY;
        for mv in &moves {
            let score = self.child_score(adapter, mv, mover, horizon, ply, alpha, beta);
            if self.aborted {
                return best.max(score);
            }
            if score > best {
                best = score;
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                self.remember_killer(mv, ply);
                break;
            }
        }
        best
    }

    fn out_of_budget(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        let stop = self.limits.is_cancelled()
            || self.limits.nodes_exhausted(self.nodes)
            || (self.nodes % DEADLINE_POLL == 0 && self.limits.past_deadline());
        if stop {
            self.aborted = true;
        }
        stop
    }

    fn order_killers(&self, moves: &mut [Move], ply: u32) {
        if !self.config.killers {
            return;
        }
        let Some(slots) = self.killers.get(ply as usize) else {
            return;
        };
        let mut front = 0;
        for killer in slots.iter().flatten() {
            if let Some(pos) = moves[front..].iter().position(|m| m == killer) {
                moves[front..=front + pos].rotate_right(1);
                front += 1;
            }
        }
    }

    fn remember_killer(&mut self, mv: &Move, ply: u32) {
        if !self.config.killers {
            return;
        }
        let ply = ply as usize;
        if self.killers.len() <= ply {
            self.killers.resize(ply + 1, [None, None]);
        }
        let slots = &mut self.killers[ply];
        if slots[0].as_ref() != Some(mv) {
            slots[1] = slots[0].take();
            slots[0] = Some(mv.clone());
        }
    }

    /// Pick among the moves within the margin of the best.
    fn choose(&mut self, scored: &[(Move, f64)]) -> (Move, f64, usize) {
        let best = scored
            .iter()
            .map(|(_, s)| *s)
            .fold(-INFINITY, f64::max);
        let margin = if is_decisive(best) {
            0.0
        } else {
            self.config.randomization
        };

        let candidates: Vec<&(Move, f64)> = if margin > 0.0 {
            scored.iter().filter(|(_, s)| *s >= best - margin).collect()
        } else {
            scored.iter().filter(|(_, s)| *s == best).take(1).collect()
        };

        let pick = match candidates.len() {
            0 | 1 => 0,
            n => self.rng.gen_range_usize(0..n),
        };
        match candidates.get(pick) {
            Some((mv, score)) => (mv.clone(), *score, candidates.len()),
            None => (scored[0].0.clone(), scored[0].1, 1),
        }
    }
}

/// Score of a finished game for `mover`; quicker wins score higher.
fn terminal_score<B: Board>(board: &B, mover: PlayerId, ply: u32) -> f64 {
    let win = VALUE_OF_WIN - f64::from(ply);
    if board.win_for_player(mover) {
        win
    } else if PlayerId::all(board.player_count()).any(|p| board.win_for_player(p)) {
        -win
    } else {
        0.0
    }
}
