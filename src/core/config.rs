//! Game setup parameters.
//!
//! A `GameSetup` carries everything needed to build the initial board of a
//! game: which game, the random seed, the player count and the rule revision.
//! Its text form is the first line of an exported game record:
//!
//! ```text
//! setup connect 42 2 1
//! ```

use serde::{Deserialize, Serialize};

use super::action::WireError;

/// Initial parameters of one game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameSetup {
    /// Registry identifier of the game module.
    pub game_id: String,

    /// Seed for any randomized initial state.
    pub seed: u64,

    /// Number of players (1-255).
    pub player_count: usize,

    /// Rule revision. Games branch on this to keep old records replayable.
    pub revision: u32,
}

impl GameSetup {
    const KEYWORD: &'static str = "setup";

    /// Create a setup with seed 0 and revision 0.
    pub fn new(game_id: impl Into<String>, player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            game_id: game_id.into(),
            seed: 0,
            player_count,
            revision: 0,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    /// The setup token: `setup <game-id> <seed> <players> <revision>`.
    #[must_use]
    pub fn to_token(&self) -> String {
        format!(
            "{} {} {} {} {}",
            Self::KEYWORD,
            self.game_id,
            self.seed,
            self.player_count,
            self.revision
        )
    }

    /// Parse a setup token.
    pub fn from_token(text: &str) -> Result<Self, WireError> {
        let bad = || WireError::BadSetup(text.trim().to_string());

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [keyword, game_id, seed, players, revision] = tokens.as_slice() else {
            return Err(bad());
        };
        if !keyword.eq_ignore_ascii_case(Self::KEYWORD) {
            return Err(bad());
        }

        let seed = seed.parse::<u64>().map_err(|_| bad())?;
        let player_count = players.parse::<usize>().map_err(|_| bad())?;
        let revision = revision.parse::<u32>().map_err(|_| bad())?;
        if player_count == 0 || player_count > 255 {
            return Err(bad());
        }

        Ok(Self {
            game_id: (*game_id).to_string(),
            seed,
            player_count,
            revision,
        })
    }
}

impl std::fmt::Display for GameSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_token())
    }
}
