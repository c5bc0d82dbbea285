//! Picks a strategy and budget per difficulty tier and returns one move.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{GameRng, Move};
use crate::mcts::{MctsSearch, StopReason};
use crate::rules::{Board, Evaluator};

use super::alphabeta::AlphaBeta;
use super::budget::CancelToken;
use super::config::EngineConfig;
use super::random::weighted_random;

/// Search algorithm behind a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    WeightedRandom,
    AlphaBeta,
    Mcts,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Weakest,
    Beginner,
    Intermediate,
    Expert,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 4] = [
        DifficultyTier::Weakest,
        DifficultyTier::Beginner,
        DifficultyTier::Intermediate,
        DifficultyTier::Expert,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyTier::Weakest => "weakest",
            DifficultyTier::Beginner => "beginner",
            DifficultyTier::Intermediate => "intermediate",
            DifficultyTier::Expert => "expert",
        }
    }
}

/// What a decision cost.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionStats {
    /// Nodes (alpha-beta), playouts (MCTS) or scored moves (weighted random).
    pub nodes: u64,
    /// Completed alpha-beta depth; 1 for weighted random.
    pub depth: u32,
    /// Score of the chosen move, when the strategy produces one.
    pub score: Option<f64>,
    pub time_us: u64,
    /// Why MCTS stopped.
    pub stop: Option<StopReason>,
    /// The budget or a cancel cut an alpha-beta search short.
    pub aborted: bool,
}

/// The single move chosen for the side to move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub mv: Move,
    pub strategy: Strategy,
    pub stats: DecisionStats,
}

/// Routes each decision to the strategy configured for its tier.
pub struct Orchestrator {
    config: EngineConfig,
    rng: GameRng,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Self {
        let rng = GameRng::new(config.mcts.seed);
        Self {
            config,
            rng,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = GameRng::new(seed);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// A handle that stops the running decision. A cancel raised between
    /// decisions stops the next one; the flag is cleared once a decision
    /// returns.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Choose a move for the side to move on `board`.
    ///
    /// The board is cloned once; the caller's board is never touched.
    ///
    /// # Panics
    ///
    /// If `board` has no legal moves.
    pub fn choose<B, E>(&mut self, board: &B, tier: DifficultyTier, evaluator: &E) -> Decision
    where
        B: Board,
        E: Evaluator<B> + ?Sized,
    {
        let decision = self.decide(board, tier, evaluator);
        self.cancel.reset();
        decision
    }

    fn decide<B, E>(&mut self, board: &B, tier: DifficultyTier, evaluator: &E) -> Decision
    where
        B: Board,
        E: Evaluator<B> + ?Sized,
    {
        let start = Instant::now();
        let settings = self.config.tiers.get(tier).clone();
        let mut rng = self.rng.fork();

        let mut moves = board.legal_moves();
        assert!(!moves.is_empty(), "no legal move to choose from");
        if moves.len() == 1 {
            let mv = moves.swap_remove(0);
            return Decision {
                mv,
                strategy: settings.strategy,
                stats: DecisionStats {
                    time_us: start.elapsed().as_micros() as u64,
                    ..DecisionStats::default()
                },
            };
        }

        let search_board = board.clone();
        let limits = settings.budget.start(&self.cancel);
        let (mv, mut stats) = match settings.strategy {
            Strategy::WeightedRandom => {
                let choice = weighted_random(search_board, evaluator, settings.temperature(), &mut rng);
                let stats = DecisionStats {
                    nodes: choice.nodes,
                    depth: 1,
                    score: Some(choice.score),
                    ..DecisionStats::default()
                };
                (choice.mv, stats)
            }
            Strategy::AlphaBeta => {
                let config = settings.alpha_beta(&self.config.alpha_beta);
                let result = AlphaBeta::new(&config, evaluator, limits, rng).search(search_board);
                let stats = DecisionStats {
                    nodes: result.nodes,
                    depth: result.depth,
                    score: Some(result.score),
                    aborted: result.aborted,
                    ..DecisionStats::default()
                };
                (result.mv, stats)
            }
            Strategy::Mcts => {
                let search = MctsSearch::new(settings.mcts(&self.config.mcts));
                let result = search.search_with_rng(search_board, &limits, &rng);
                let stats = DecisionStats {
                    nodes: result.stats.iterations,
                    score: Some(result.mean_reward),
                    stop: result.stats.stop,
                    ..DecisionStats::default()
                };
                (result.mv, stats)
            }
        };
        stats.time_us = start.elapsed().as_micros() as u64;

        info!(
            tier = tier.as_str(),
            strategy = ?settings.strategy,
            mv = %board.describe_move(&mv),
            nodes = stats.nodes,
            time_us = stats.time_us,
            "Move chosen"
        );
        Decision {
            mv,
            strategy: settings.strategy,
            stats,
        }
    }
}
