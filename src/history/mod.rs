//! Move history: the ledger, game records and replay verification.

pub mod ledger;
pub mod replay;

pub use ledger::{Checkpoint, Ledger, LedgerEntry, RecordOutcome};
pub use replay::{rebuild, replay, replay_moves, verify, GameRecord, ReplayError};
