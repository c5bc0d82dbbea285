//! # rust-boardgame
//!
//! A generic board-game substrate: one AI search and synchronization
//! framework that drives any game implementing a small contract.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: search, replay and the ledger only ever talk to a
//!    game through the `Board` trait.
//!
//! 2. **N-Player First**: rewards and results are per player; nothing assumes
//!    two sides or strict alternation.
//!
//! 3. **No Divergence**: live play, replay and lookahead run the same
//!    `execute`/`unexecute` code, and fingerprints prove they agree.
//!
//! ## Architecture
//!
//! - **Incremental undo**: search walks one board clone forward and back
//!   instead of copying positions.
//!
//! - **Fingerprints**: reproducible 64-bit hashes used for repetition,
//!   ledger elision, unmove checks and replay verification.
//!
//! - **Hybrid search**: alpha-beta or multi-threaded MCTS, selected per
//!   difficulty tier.
//!
//! ## Modules
//!
//! - `core`: players, moves and their wire format, fingerprints, RNG, setup
//! - `rules`: the `Board` contract, evaluators, type erasure, game registry
//! - `history`: move ledger, game records and replay
//! - `search`: search adapter, alpha-beta, budgets, orchestrator
//! - `mcts`: Monte Carlo Tree Search
//! - `games`: reference connection and capture games
//! - `session`: the live game and its ledger

pub mod core;
pub mod rules;
pub mod history;
pub mod search;
pub mod mcts;
pub mod games;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    PlayerId, PlayerMap,
    GameRng,
    Move, OpCode, Operand, Vocabulary, WireError,
    Fingerprint, Fingerprinter,
    GameSetup,
};

pub use crate::rules::{
    Board, ExecuteMode, GameResult,
    Evaluator, NullEvaluator,
    AnyBoard, ErasedBoard,
    GameRegistry, RegistryError,
};

pub use crate::history::{Ledger, LedgerEntry, RecordOutcome, GameRecord, ReplayError};

pub use crate::search::{
    SearchAdapter, AlphaBeta, AlphaBetaConfig, DepthPolicy,
    Budget, CancelToken, EngineConfig, ConfigError,
    Orchestrator, Decision, DifficultyTier, Strategy,
};

pub use crate::mcts::{
    MctsConfig, MctsSearch, MctsResult, SearchTree,
    SearchStats, TreeStats, StopReason,
    SelectionPolicy, SimulationPolicy, Uct, UniformPlayout, WeightedPlayout,
};

pub use crate::session::{GameSession, MoveError};
