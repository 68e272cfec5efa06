//! Runtime configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! `dicecog.toml`, and `DICECOG_*` environment variables.

use crate::budget::Budget;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] figment::Error),
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Upper bound on multi-roll iterations; the lower bound is always 1.
    pub max_iterations: usize,
    /// Dice one invocation may roll, across all of its iterations.
    pub max_rolls: usize,
    pub roll_budget: usize,
    pub multiroll_budget: usize,
    pub sample_prefix: usize,
    /// Seed for a reproducible random source. Unset means `thread_rng`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub stat_counter: String,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_rolls: 1000,
            roll_budget: Budget::SINGLE_ROLL.limit,
            multiroll_budget: Budget::MULTIROLL.limit,
            sample_prefix: Budget::MULTIROLL.sample_prefix,
            seed: None,
            stat_counter: "dice_rolled_life".to_string(),
        }
    }
}

impl DiceConfig {
    pub const FILE: &'static str = "dicecog.toml";
    pub const ENV_PREFIX: &'static str = "DICECOG_";

    pub fn figment_from(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(Self::ENV_PREFIX))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment_from(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("max_iterations", self.max_iterations),
            ("max_rolls", self.max_rolls),
            ("roll_budget", self.roll_budget),
            ("multiroll_budget", self.multiroll_budget),
            ("sample_prefix", self.sample_prefix),
        ];
        match checks.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Zero(*name)),
            None => Ok(()),
        }
    }

    pub fn single_roll_budget(&self) -> Budget {
        Budget::new(self.roll_budget, self.sample_prefix)
    }

    pub fn multiroll_budget(&self) -> Budget {
        Budget::new(self.multiroll_budget, self.sample_prefix)
    }
}
