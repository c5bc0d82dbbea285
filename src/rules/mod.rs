//! The board contract and everything needed to drive games generically.
//!
//! Games implement `Board` to define:
//! - How moves modify state, and how to take them back
//! - Legal moves for the side to move
//! - Terminal conditions and the state fingerprint
//!
//! The search engines, the ledger and the session call into `Board` but
//! never interpret game-specific concepts directly.

pub mod board;
pub mod erased;
pub mod evaluator;
pub mod registry;

pub use board::{Board, ExecuteMode, GameResult};
pub use erased::{AnyBoard, ErasedBoard, ErasedEvaluator};
pub use evaluator::{bounded, is_decisive, Evaluator, NullEvaluator, MAX_EVALUATION, VALUE_OF_WIN};
pub use registry::{AnyEvaluator, BoardFactory, GameRegistry, RegistryError};
