//! Game-independent search: the adapter onto a live board clone, alpha-beta,
//! weighted random play, budgets, and the per-tier orchestrator.
//!
//! MCTS lives in [`crate::mcts`] and is driven from here by the orchestrator.

pub mod adapter;
pub mod alphabeta;
pub mod budget;
pub mod config;
pub mod orchestrator;
pub mod random;

pub use adapter::SearchAdapter;
pub use alphabeta::{AlphaBeta, AlphaBetaConfig, AlphaBetaResult, DepthPolicy};
pub use budget::{Budget, CancelToken, Limits};
pub use config::{apply_env_overrides, apply_overrides, ConfigError, EngineConfig, TierSettings, Tiers};
pub use orchestrator::{Decision, DecisionStats, DifficultyTier, Orchestrator, Strategy};
pub use random::{weighted_random, WeightedChoice, DEFAULT_TEMPERATURE};
