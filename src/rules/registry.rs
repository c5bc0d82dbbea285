//! Explicit game registry.
//!
//! Maps a game id to its board constructor and evaluator. The registry is an
//! ordinary value built at startup and passed by reference; nothing here is
//! global.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::GameSetup;

use super::board::Board;
use super::erased::{AnyBoard, ErasedEvaluator};
use super::evaluator::Evaluator;

/// Constructs the initial board for a setup.
pub type BoardFactory = Box<dyn Fn(&GameSetup) -> Result<AnyBoard, RegistryError> + Send + Sync>;

/// Shared evaluator for registry-created boards.
pub type AnyEvaluator = Arc<dyn Evaluator<AnyBoard>>;

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown game '{0}'")]
    UnknownGame(String),

    #[error("game '{0}' is already registered")]
    Duplicate(String),

    #[error("game '{game}' does not support this setup: {reason}")]
    UnsupportedSetup { game: String, reason: String },
}

struct GameEntry {
    create: BoardFactory,
    evaluator: AnyEvaluator,
}

/// Game id to constructor and evaluator.
#[derive(Default)]
pub struct GameRegistry {
    games: FxHashMap<String, GameEntry>,
}

impl GameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a game. Fails if the id is taken.
    pub fn register<B, F, E>(&mut self, id: &str, create: F, evaluator: E) -> Result<(), RegistryError>
    where
        B: Board,
        F: Fn(&GameSetup) -> Result<B, RegistryError> + Send + Sync + 'static,
        E: Evaluator<B> + 'static,
    {
        if self.games.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_string()));
        }
        self.insert(id, create, evaluator);
        Ok(())
    }

    /// Register a game, replacing any existing entry with the same id.
    pub fn replace<B, F, E>(&mut self, id: &str, create: F, evaluator: E)
    where
        B: Board,
        F: Fn(&GameSetup) -> Result<B, RegistryError> + Send + Sync + 'static,
        E: Evaluator<B> + 'static,
    {
        if self.games.contains_key(id) {
            warn!(game = %id, "Overriding existing game registration");
        }
        self.insert(id, create, evaluator);
    }

    fn insert<B, F, E>(&mut self, id: &str, create: F, evaluator: E)
    where
        B: Board,
        F: Fn(&GameSetup) -> Result<B, RegistryError> + Send + Sync + 'static,
        E: Evaluator<B> + 'static,
    {
        let entry = GameEntry {
            create: Box::new(move |setup| create(setup).map(|b| Box::new(b) as AnyBoard)),
            evaluator: Arc::new(ErasedEvaluator::new(evaluator)),
        };
        self.games.insert(id.to_string(), entry);
        debug!(game = %id, "Registered game");
    }

    /// Build the initial board for `setup`.
    pub fn create(&self, setup: &GameSetup) -> Result<AnyBoard, RegistryError> {
        let entry = self
            .games
            .get(&setup.game_id)
            .ok_or_else(|| RegistryError::UnknownGame(setup.game_id.clone()))?;
        (entry.create)(setup)
    }

    pub fn evaluator(&self, id: &str) -> Result<AnyEvaluator, RegistryError> {
        self.games
            .get(id)
            .map(|e| Arc::clone(&e.evaluator))
            .ok_or_else(|| RegistryError::UnknownGame(id.to_string()))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.games.contains_key(id)
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.games.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl std::fmt::Debug for GameRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRegistry").field("games", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect::{ConnectBoard, ConnectEvaluator};
    use crate::rules::evaluator::NullEvaluator;

    fn registry() -> GameRegistry {
        let mut registry = GameRegistry::new();
        registry
            .register("connect", ConnectBoard::from_setup, ConnectEvaluator)
            .unwrap();
        registry
    }

    #[test]
    fn test_create_known_game() {
        let registry = registry();
        let board = registry.create(&GameSetup::new("connect", 2)).unwrap();
        assert_eq!(board.player_count(), 2);
        assert!(!board.legal_moves().is_empty());
    }

    #[test]
    fn test_unknown_game() {
        let registry = registry();
        let err = registry.create(&GameSetup::new("chess", 2)).unwrap_err();
        assert_eq!(err, RegistryError::UnknownGame("chess".into()));
        assert!(registry.evaluator("chess").is_err());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let err = registry
            .register("connect", ConnectBoard::from_setup, NullEvaluator)
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("connect".into()));

        registry.replace("connect", ConnectBoard::from_setup, NullEvaluator);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_erased_evaluator_reaches_concrete_board() {
        let registry = registry();
        let board = registry.create(&GameSetup::new("connect", 2)).unwrap();
        let eval = registry.evaluator("connect").unwrap();
        let score = eval.evaluate(&board, board.current_player());
        assert!(score.is_finite());
    }

    #[test]
    fn test_created_board_debug() {
        let registry = registry();
        let board = registry.create(&GameSetup::new("connect", 2)).unwrap();
        let text = format!("{board:?}");
        assert!(text.starts_with("AnyBoard"), "{text}");
        assert!(text.contains("move_number: 0"), "{text}");
    }

    #[test]
    fn test_unsupported_setup() {
        let registry = registry();
        let err = registry.create(&GameSetup::new("connect", 3)).unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedSetup { .. }));
    }
}
