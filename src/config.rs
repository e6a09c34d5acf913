//! Agent hyperparameters and the JSON file they are loaded from

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::Transition;
use crate::error::{Error, Result};

/// Learning hyperparameters of one agent.
///
/// Every key must be present when deserializing; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct AgentConfig {
    /// How far a new estimate overrides the old one.
    pub learning_rate: f64,
    /// Weight of future rewards.
    pub discount_factor: f64,
    /// Probability of exploring in the first episode.
    pub epsilon_start: f64,
    /// Probability of exploring once all episodes are done.
    pub epsilon_end: f64,
    pub survival_reward: f64,
    pub death_penalty: f64,
    pub victory_reward: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            discount_factor: 0.5,
            epsilon_start: 0.8,
            epsilon_end: 0.1,
            survival_reward: 1.0,
            death_penalty: -5.0,
            victory_reward: 100.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    LearningRate,
    DiscountFactor,
    EpsilonStart,
    EpsilonEnd,
    SurvivalReward,
    DeathPenalty,
    VictoryReward,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 7] = [
        ConfigKey::LearningRate,
        ConfigKey::DiscountFactor,
        ConfigKey::EpsilonStart,
        ConfigKey::EpsilonEnd,
        ConfigKey::SurvivalReward,
        ConfigKey::DeathPenalty,
        ConfigKey::VictoryReward,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::LearningRate => "LEARNING_RATE",
            ConfigKey::DiscountFactor => "DISCOUNT_FACTOR",
            ConfigKey::EpsilonStart => "EPSILON_START",
            ConfigKey::EpsilonEnd => "EPSILON_END",
            ConfigKey::SurvivalReward => "SURVIVAL_REWARD",
            ConfigKey::DeathPenalty => "DEATH_PENALTY",
            ConfigKey::VictoryReward => "VICTORY_REWARD",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConfigKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::UnknownConfigKey { key: s.to_string() })
    }
}

impl AgentConfig {
    pub fn get(&self, key: ConfigKey) -> f64 {
        match key {
            ConfigKey::LearningRate => self.learning_rate,
            ConfigKey::DiscountFactor => self.discount_factor,
            ConfigKey::EpsilonStart => self.epsilon_start,
            ConfigKey::EpsilonEnd => self.epsilon_end,
            ConfigKey::SurvivalReward => self.survival_reward,
            ConfigKey::DeathPenalty => self.death_penalty,
            ConfigKey::VictoryReward => self.victory_reward,
        }
    }

    fn slot(&mut self, key: ConfigKey) -> &mut f64 {
        match key {
            ConfigKey::LearningRate => &mut self.learning_rate,
            ConfigKey::DiscountFactor => &mut self.discount_factor,
            ConfigKey::EpsilonStart => &mut self.epsilon_start,
            ConfigKey::EpsilonEnd => &mut self.epsilon_end,
            ConfigKey::SurvivalReward => &mut self.survival_reward,
            ConfigKey::DeathPenalty => &mut self.death_penalty,
            ConfigKey::VictoryReward => &mut self.victory_reward,
        }
    }

    /// Updates existing keys by name.
    ///
    /// The whole batch is validated before anything is written: one unknown
    /// key or out-of-range value leaves the configuration untouched.
    pub fn configure<I, K>(&mut self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut candidate = *self;
        for (name, value) in updates {
            let key: ConfigKey = name.as_ref().parse()?;
            debug!(%key, value, "configure");
            *candidate.slot(key) = value;
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Every value must be finite. `LEARNING_RATE` and both epsilons lie in
    /// `[0, 1]`, `DISCOUNT_FACTOR` in `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        for key in ConfigKey::ALL.iter() {
            let value = self.get(*key);
            if !value.is_finite() {
                return Err(Error::InvalidConfiguration {
                    message: format!("{} must be finite, got {}", key, value),
                });
            }
        }

        let unit = |key: ConfigKey| {
            let value = self.get(key);
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::InvalidConfiguration {
                    message: format!("{} must be within [0, 1], got {}", key, value),
                })
            }
        };
        unit(ConfigKey::LearningRate)?;
        unit(ConfigKey::EpsilonStart)?;
        unit(ConfigKey::EpsilonEnd)?;

        if !(0.0..1.0).contains(&self.discount_factor) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "{} must be within [0, 1), got {}",
                    ConfigKey::DiscountFactor,
                    self.discount_factor
                ),
            });
        }
        Ok(())
    }

    /// Victory beats death, death beats survival.
    pub fn reward_for(&self, transition: &Transition) -> f64 {
        if transition.reached_goal {
            self.victory_reward
        } else if transition.ran_into_wall {
            self.death_penalty
        } else {
            self.survival_reward
        }
    }
}

/// Agent configurations keyed by agent name, e.g. `{"QAGENT": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFile {
    agents: BTreeMap<String, AgentConfig>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read config {}", path.display()), e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(contents)?;
        for config in file.agents.values() {
            config.validate()?;
        }
        Ok(file)
    }

    pub fn agent(&self, name: &str) -> Result<AgentConfig> {
        self.agents
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingAgentConfig {
                name: name.to_string(),
            })
    }

    pub fn insert(&mut self, name: impl Into<String>, config: AgentConfig) {
        self.agents.insert(name.into(), config);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }
}
