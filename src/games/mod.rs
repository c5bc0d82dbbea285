//! Reference game modules.
//!
//! Each game implements `Board` independently and shares geometry through
//! `SquareGrid` rather than a common base board.

pub mod connect;
pub mod geometry;
pub mod stones;

use crate::rules::{GameRegistry, RegistryError};

/// A registry holding every reference game.
pub fn standard_registry() -> Result<GameRegistry, RegistryError> {
    let mut registry = GameRegistry::new();
    registry.register("connect", connect::ConnectBoard::from_setup, connect::ConnectEvaluator)?;
    registry.register("stones", stones::StonesBoard::from_setup, stones::StonesEvaluator)?;
    Ok(registry)
}
