//! Core types: players, RNG, moves and their wire format, fingerprints, setup.
//!
//! Everything here is game-agnostic. Game modules build on these types and
//! never extend them.

pub mod player;
pub mod rng;
pub mod action;
pub mod fingerprint;
pub mod config;

pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use action::{Move, OpCode, Operand, Vocabulary, WireError};
pub use fingerprint::{Fingerprint, Fingerprinter};
pub use config::GameSetup;
