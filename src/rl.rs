use rand::{Rng, RngCore};

use crate::config::AgentConfig;
use crate::environment::Movement;
use crate::q_table::QTable;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    Explore,
    Exploit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Selection {
    pub action: usize,
    pub strategy: Strategy,
}

pub trait ExplorationStrategy {
    /// Probability of exploring during `episode` out of `num_episodes`.
    fn exploration_rate(&self, config: &AgentConfig, episode: usize, num_episodes: usize) -> f64;

    fn select_action(
        &self,
        state: usize,
        q_table: &QTable,
        exploration_rate: f64,
        rng: &mut dyn RngCore,
    ) -> Selection {
        if rng.gen::<f64>() <= exploration_rate {
            Selection {
                action: random_action(rng),
                strategy: Strategy::Explore,
            }
        } else {
            Selection {
                action: q_table.greedy_action(state),
                strategy: Strategy::Exploit,
            }
        }
    }
}

pub fn random_action(rng: &mut dyn RngCore) -> usize {
    rng.gen::<Movement>().index()
}

/// Epsilon-greedy with epsilon moving linearly from `EPSILON_START` at the
/// first episode to `EPSILON_END` at `num_episodes`.
#[derive(Debug, Default, Copy, Clone)]
pub struct LinearEpsilonDecay;

impl LinearEpsilonDecay {
    pub fn epsilon(start: f64, end: f64, episode: usize, num_episodes: usize) -> f64 {
        if num_episodes == 0 {
            return start;
        }
        let slope = (end - start) / num_episodes as f64;
        slope * episode as f64 + start
    }
}

impl ExplorationStrategy for LinearEpsilonDecay {
    fn exploration_rate(&self, config: &AgentConfig, episode: usize, num_episodes: usize) -> f64 {
        Self::epsilon(config.epsilon_start, config.epsilon_end, episode, num_episodes)
    }
}

/// Always greedy.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoExploration;

impl ExplorationStrategy for NoExploration {
    fn exploration_rate(&self, _config: &AgentConfig, _episode: usize, _num_episodes: usize) -> f64 {
        0.0
    }

    fn select_action(
        &self,
        state: usize,
        q_table: &QTable,
        _exploration_rate: f64,
        _rng: &mut dyn RngCore,
    ) -> Selection {
        Selection {
            action: q_table.greedy_action(state),
            strategy: Strategy::Exploit,
        }
    }
}

pub trait UpdateRule {
    /// Folds one observed transition into the table. `next_state` is where
    /// the agent stands after the step, which is the start cell after a wall
    /// hit or a win.
    fn update(
        &self,
        q_table: &mut QTable,
        config: &AgentConfig,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
    );
}

#[derive(Debug, Default, Copy, Clone)]
pub struct QLearning;

impl UpdateRule for QLearning {
    fn update(
        &self,
        q_table: &mut QTable,
        config: &AgentConfig,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
    ) {
        let alpha = config.learning_rate;
        let gamma = config.discount_factor;

        let current_term = (1.0 - alpha) * q_table.get(state, action);
        let reward_term = alpha * reward;
        let future_term = alpha * gamma * q_table.max_value(next_state);

        q_table.set(state, action, current_term + reward_term + future_term);
    }
}
