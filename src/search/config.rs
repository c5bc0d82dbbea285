//! Engine configuration: search defaults plus per-tier strategy and budget.
//!
//! Loaded from TOML with every section optional:
//!
//! ```toml
//! [mcts]
//! threads = 4
//!
//! [alpha_beta]
//! depth = { plies = 6 }
//!
//! [tiers.expert]
//! strategy = "mcts"
//! budget = { time_ms = 3000 }
//! ```
//!
//! Environment variables `BOARDGAME_<SECTION>_<KEY>` override file values.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::mcts::MctsConfig;

use super::alphabeta::AlphaBetaConfig;
use super::budget::Budget;
use super::orchestrator::{DifficultyTier, Strategy};
use super::random::DEFAULT_TEMPERATURE;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(String),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// How one difficulty tier plays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub strategy: Strategy,
    pub budget: Budget,
    /// Alpha-beta depth, replacing the `[alpha_beta]` depth.
    pub depth: Option<u32>,
    /// Alpha-beta randomization margin.
    pub randomization: Option<f64>,
    /// Softmax temperature for weighted random play.
    pub temperature: Option<f64>,
    /// MCTS worker threads.
    pub threads: Option<usize>,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::AlphaBeta,
            budget: Budget::unlimited(),
            depth: None,
            randomization: None,
            temperature: None,
            threads: None,
        }
    }
}

impl TierSettings {
    #[must_use]
    pub fn new(strategy: Strategy, budget: Budget) -> Self {
        Self {
            strategy,
            budget,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_randomization(mut self, margin: f64) -> Self {
        self.randomization = Some(margin);
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// The alpha-beta config this tier runs with.
    #[must_use]
    pub fn alpha_beta(&self, base: &AlphaBetaConfig) -> AlphaBetaConfig {
        let mut config = base.clone();
        if let Some(depth) = self.depth {
            config.depth = config.depth.with_depth(depth);
        }
        if let Some(margin) = self.randomization {
            config = config.with_randomization(margin);
        }
        config
    }

    /// The MCTS config this tier runs with.
    #[must_use]
    pub fn mcts(&self, base: &MctsConfig) -> MctsConfig {
        match self.threads {
            Some(threads) => base.clone().with_threads(threads),
            None => base.clone(),
        }
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

/// Settings for every difficulty tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tiers {
    pub weakest: TierSettings,
    pub beginner: TierSettings,
    pub intermediate: TierSettings,
    pub expert: TierSettings,
}

impl Default for Tiers {
    fn default() -> Self {
        Self {
            weakest: TierSettings::new(Strategy::WeightedRandom, Budget::unlimited()),
            beginner: TierSettings::new(Strategy::AlphaBeta, Budget::time(500))
                .with_depth(2)
                .with_randomization(50.0),
            intermediate: TierSettings::new(Strategy::AlphaBeta, Budget::time(2_000)).with_depth(4),
            expert: TierSettings::new(Strategy::Mcts, Budget::time(3_000).with_nodes(200_000)),
        }
    }
}

impl Tiers {
    #[must_use]
    pub fn get(&self, tier: DifficultyTier) -> &TierSettings {
        match tier {
            DifficultyTier::Weakest => &self.weakest,
            DifficultyTier::Beginner => &self.beginner,
            DifficultyTier::Intermediate => &self.intermediate,
            DifficultyTier::Expert => &self.expert,
        }
    }

    pub fn get_mut(&mut self, tier: DifficultyTier) -> &mut TierSettings {
        match tier {
            DifficultyTier::Weakest => &mut self.weakest,
            DifficultyTier::Beginner => &mut self.beginner,
            DifficultyTier::Intermediate => &mut self.intermediate,
            DifficultyTier::Expert => &mut self.expert,
        }
    }
}

/// Top-level search configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mcts: MctsConfig,
    pub alpha_beta: AlphaBetaConfig,
    pub tiers: Tiers,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document, falling back to the defaults on any error.
    /// Environment overrides are applied either way.
    #[must_use]
    pub fn from_toml_or_default(text: &str) -> Self {
        let config = match Self::from_toml_str(text) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Engine config rejected, using defaults");
                Self::default()
            }
        };
        apply_env_overrides(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mcts = &self.mcts;
        if !mcts.exploration.is_finite() || mcts.exploration < 0.0 {
            return Err(ConfigError::invalid("mcts.exploration", "must be a non-negative number"));
        }
        if mcts.threads == 0 {
            return Err(ConfigError::invalid("mcts.threads", "must be at least 1"));
        }
        if mcts.max_nodes == 0 {
            return Err(ConfigError::invalid("mcts.max_nodes", "must be at least 1"));
        }
        if !mcts.kill_share.is_finite() || mcts.kill_share < 0.0 {
            return Err(ConfigError::invalid("mcts.kill_share", "must be a non-negative number"));
        }
        if !mcts.node_expansion_rate.is_finite() || mcts.node_expansion_rate < 0.0 {
            return Err(ConfigError::invalid(
                "mcts.node_expansion_rate",
                "must be a non-negative number",
            ));
        }
        if self.alpha_beta.depth.depth() == 0 {
            return Err(ConfigError::invalid("alpha_beta.depth", "must be at least 1"));
        }
        if self.alpha_beta.randomization < 0.0 {
            return Err(ConfigError::invalid("alpha_beta.randomization", "must not be negative"));
        }

        for tier in DifficultyTier::ALL {
            let settings = self.tiers.get(tier);
            let field = |name: &str| format!("tiers.{}.{name}", tier.as_str());
            if settings.budget.nodes == Some(0) {
                return Err(ConfigError::invalid(field("budget.nodes"), "must be at least 1"));
            }
            if settings.depth == Some(0) {
                return Err(ConfigError::invalid(field("depth"), "must be at least 1"));
            }
            if settings.randomization.is_some_and(|m| !(m >= 0.0)) {
                return Err(ConfigError::invalid(field("randomization"), "must not be negative"));
            }
            if settings.temperature.is_some_and(|t| !(t > 0.0)) {
                return Err(ConfigError::invalid(field("temperature"), "must be positive"));
            }
            if settings.threads == Some(0) {
                return Err(ConfigError::invalid(field("threads"), "must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // Parseable field (u64, f64, bool, etc.)
    ($lookup:expr, $config:expr, $($field:ident).+, $key:expr, parse) => {
        if let Some(raw) = $lookup($key) {
            match raw.parse() {
                Ok(v) => $config.$($field).+ = v,
                Err(_) => warn!(key = $key, value = %raw, "Ignoring unparsable environment override"),
            }
        }
    };
    // Optional parseable field (Option<u64>, Option<f64>, etc.)
    ($lookup:expr, $config:expr, $($field:ident).+, $key:expr, optional_parse) => {
        if let Some(raw) = $lookup($key) {
            match raw.parse() {
                Ok(v) => $config.$($field).+ = Some(v),
                Err(_) => warn!(key = $key, value = %raw, "Ignoring unparsable environment override"),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: BOARDGAME_<SECTION>_<KEY>
pub fn apply_env_overrides(config: EngineConfig) -> EngineConfig {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `BOARDGAME_*` overrides read through `lookup`.
pub fn apply_overrides<F>(mut config: EngineConfig, lookup: F) -> EngineConfig
where
    F: Fn(&str) -> Option<String>,
{
    // MCTS
    env_override!(lookup, config, mcts.threads, "BOARDGAME_MCTS_THREADS", parse);
    env_override!(lookup, config, mcts.seed, "BOARDGAME_MCTS_SEED", parse);
    env_override!(lookup, config, mcts.max_nodes, "BOARDGAME_MCTS_MAX_NODES", parse);
    env_override!(lookup, config, mcts.exploration, "BOARDGAME_MCTS_EXPLORATION", parse);
    env_override!(lookup, config, mcts.kill_share, "BOARDGAME_MCTS_KILL_SHARE", parse);
    env_override!(lookup, config, mcts.early_exit, "BOARDGAME_MCTS_EARLY_EXIT", parse);

    // Alpha-beta
    env_override!(lookup, config, alpha_beta.verify_unmove, "BOARDGAME_ALPHA_BETA_VERIFY_UNMOVE", parse);
    env_override!(lookup, config, alpha_beta.randomization, "BOARDGAME_ALPHA_BETA_RANDOMIZATION", parse);

    // Tiers
    env_override!(lookup, config, tiers.expert.budget.time_ms, "BOARDGAME_TIERS_EXPERT_TIME_MS", optional_parse);
    env_override!(lookup, config, tiers.expert.budget.nodes, "BOARDGAME_TIERS_EXPERT_NODES", optional_parse);
    env_override!(lookup, config, tiers.expert.threads, "BOARDGAME_TIERS_EXPERT_THREADS", optional_parse);
    env_override!(
        lookup,
        config,
        tiers.intermediate.budget.time_ms,
        "BOARDGAME_TIERS_INTERMEDIATE_TIME_MS",
        optional_parse
    );

    config.mcts.threads = config.mcts.threads.max(1);
    config
}
