use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::codec::{decode_action, StateCodec};
use crate::config::AgentConfig;
use crate::environment::{Maze, Pos, Transition};
use crate::error::{Error, Result};
use crate::observers::TrainingObserver;
use crate::policy::DetPolicy;
use crate::q_table::QTable;
use crate::rl::{random_action, ExplorationStrategy, LinearEpsilonDecay, QLearning, Strategy, UpdateRule};

pub const DEFAULT_AGENT_NAME: &str = "QAGENT";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub exploration_rate: f64,
    pub turns: u64,
    pub wall_hits: u64,
    /// Turns spent on random actions.
    pub explored: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeStats>,
    /// Turns taken over the whole run, the quantity bounded by the call limit.
    pub total_turns: u64,
}

impl TrainingReport {
    pub fn to_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for stats in &self.episodes {
            wtr.serialize(stats)?;
        }
        wtr.flush()
            .map_err(|e| Error::io("flush training history", e))?;
        Ok(())
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
        self.to_csv(file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    ReachedGoal { turns: usize, path: Vec<Pos> },
    /// The greedy policy did not reach the goal in time; the maze was reset.
    TurnLimitReached { turns: usize, path: Vec<Pos> },
}

impl PlayOutcome {
    pub fn reached_goal(&self) -> bool {
        matches!(self, PlayOutcome::ReachedGoal { .. })
    }

    pub fn turns(&self) -> usize {
        match self {
            PlayOutcome::ReachedGoal { turns, .. } | PlayOutcome::TurnLimitReached { turns, .. } => *turns,
        }
    }

    pub fn path(&self) -> &[Pos] {
        match self {
            PlayOutcome::ReachedGoal { path, .. } | PlayOutcome::TurnLimitReached { path, .. } => path,
        }
    }
}

/// Tabular Q-learning agent that owns the maze it learns to solve.
pub struct QAgent<R = StdRng> {
    name: String,
    maze: Maze,
    config: AgentConfig,
    codec: StateCodec,
    q_table: QTable,
    exploration: Box<dyn ExplorationStrategy>,
    update_rule: Box<dyn UpdateRule>,
    rng: R,
}

impl QAgent<StdRng> {
    /// Seeded agent, or one seeded from entropy when `seed` is `None`.
    pub fn with_seed(name: impl Into<String>, maze: Maze, config: AgentConfig, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        QAgent::new(name, maze, config, rng)
    }
}

impl<R: Rng> QAgent<R> {
    pub fn new(name: impl Into<String>, maze: Maze, config: AgentConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let codec = StateCodec::for_maze(&maze);
        Ok(Self {
            name: name.into(),
            q_table: QTable::new(codec.num_states()),
            codec,
            maze,
            config,
            exploration: Box::new(LinearEpsilonDecay),
            update_rule: Box::new(QLearning),
            rng,
        })
    }

    pub fn with_exploration(mut self, exploration: impl ExplorationStrategy + 'static) -> Self {
        self.exploration = Box::new(exploration);
        self
    }

    pub fn with_update_rule(mut self, update_rule: impl UpdateRule + 'static) -> Self {
        self.update_rule = Box::new(update_rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn maze_mut(&mut self) -> &mut Maze {
        &mut self.maze
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn configure<I, K>(&mut self, updates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.config.configure(updates)
    }

    pub fn state(&self) -> usize {
        self.codec.encode(self.maze.position())
    }

    /// One learning turn with the given strategy.
    pub fn turn(&mut self, strategy: Strategy) -> Result<Transition> {
        let state = self.state();
        let action = match strategy {
            Strategy::Explore => random_action(&mut self.rng),
            Strategy::Exploit => self.q_table.greedy_action(state),
        };
        self.learn_from(state, action)
    }

    // the next state is read after the maze had its chance to reset
    fn learn_from(&mut self, state: usize, action: usize) -> Result<Transition> {
        let movement = decode_action(action).ok_or(Error::InvalidAction { action })?;
        let transition = self.maze.step(movement);
        let reward = self.config.reward_for(&transition);
        let next_state = self.state();
        self.update_rule
            .update(&mut self.q_table, &self.config, state, action, reward, next_state);
        trace!(state, action, reward, next_state, "update");
        Ok(transition)
    }

    /// Runs `num_episodes` episodes, each until the goal is reached.
    ///
    /// Fails with [`Error::CallLimitExceeded`] once `call_limit` turns have
    /// been taken across the whole run. The maze is silenced for the
    /// duration.
    pub fn train(
        &mut self,
        num_episodes: usize,
        call_limit: u64,
        observer: &mut dyn TrainingObserver,
    ) -> Result<TrainingReport> {
        let was_silent = self.maze.set_silent(true);
        let result = self.run_episodes(num_episodes, call_limit, observer);
        self.maze.set_silent(was_silent);
        result
    }

    fn run_episodes(
        &mut self,
        num_episodes: usize,
        call_limit: u64,
        observer: &mut dyn TrainingObserver,
    ) -> Result<TrainingReport> {
        info!(agent = %self.name, num_episodes, call_limit, "training started");
        observer.on_training_start(num_episodes)?;

        let mut report = TrainingReport::default();
        for episode in 0..num_episodes {
            self.maze.reset();
            let exploration_rate = self
                .exploration
                .exploration_rate(&self.config, episode, num_episodes);
            let mut stats = EpisodeStats {
                episode,
                exploration_rate,
                turns: 0,
                wall_hits: 0,
                explored: 0,
            };

            loop {
                if report.total_turns >= call_limit {
                    warn!(limit = call_limit, episode, "call limit reached");
                    return Err(Error::CallLimitExceeded { limit: call_limit });
                }
                report.total_turns += 1;

                let state = self.state();
                let selection = self.exploration.select_action(
                    state,
                    &self.q_table,
                    exploration_rate,
                    &mut self.rng,
                );
                let transition = self.learn_from(state, selection.action)?;

                stats.turns += 1;
                if selection.strategy == Strategy::Explore {
                    stats.explored += 1;
                }
                if transition.ran_into_wall {
                    stats.wall_hits += 1;
                }
                if transition.reached_goal {
                    break;
                }
            }

            debug!(episode, turns = stats.turns, wall_hits = stats.wall_hits, "episode finished");
            observer.on_episode_end(&stats)?;
            report.episodes.push(stats);
        }

        observer.on_training_end(&report)?;
        info!(agent = %self.name, total_turns = report.total_turns, "training finished");
        Ok(report)
    }

    /// Follows the greedy policy without learning. Running out of turns is
    /// reported in the outcome, not as an error.
    pub fn play(&mut self, call_limit: usize) -> Result<PlayOutcome> {
        let mut path = Vec::new();
        for turn in 1..=call_limit {
            path.push(self.maze.position());
            let action = self.q_table.greedy_action(self.state());
            let movement = decode_action(action).ok_or(Error::InvalidAction { action })?;
            let transition = self.maze.step(movement);
            if transition.reached_goal {
                path.extend(transition.target);
                info!(turns = turn, "policy reached the target");
                return Ok(PlayOutcome::ReachedGoal { turns: turn, path });
            }
        }

        warn!(call_limit, "Call limit reached. Policy does not appear to lead to target.");
        self.maze.reset();
        Ok(PlayOutcome::TurnLimitReached {
            turns: call_limit,
            path,
        })
    }

    pub fn greedy_policy(&self) -> DetPolicy {
        DetPolicy::from_q_table(&self.maze, &self.codec, &self.q_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Movement;
    use crate::observers::NoopObserver;
    use crate::rl::NoExploration;

    fn agent(layout: &str, seed: u64) -> QAgent {
        QAgent::with_seed(DEFAULT_AGENT_NAME, layout.parse().unwrap(), AgentConfig::default(), Some(seed)).unwrap()
    }

    #[test]
    fn q_table_is_sized_by_the_maze() {
        let agent = QAgent::with_seed("QAGENT", Maze::classic(), AgentConfig::default(), Some(1)).unwrap();
        assert_eq!(agent.q_table().num_states(), 56);
        assert_eq!(agent.name(), "QAGENT");
    }

    #[test]
    fn winning_turn_bootstraps_from_start_state() {
        let mut agent = agent("####\n#SG#\n####", 3);
        let start = agent.state();
        agent.q_table.set(start, Movement::Up.index(), 10.0);
        agent.q_table.set(start, Movement::Right.index(), 0.0);
        agent.q_table.set(start, Movement::Down.index(), -1.0);
        agent.q_table.set(start, Movement::Left.index(), -1.0);
        agent.learn_from(start, Movement::Right.index()).unwrap();
        // 100 + 0.5 * max(Q[start]) where Q[start][up] = 10
        assert_eq!(agent.q_table().get(start, Movement::Right.index()), 105.0);
        assert_eq!(agent.maze().position(), agent.maze().start_pos());
    }

    #[test]
    fn wall_turn_takes_death_penalty() {
        let mut agent = agent("####\n#SG#\n####", 3);
        let start = agent.state();
        let transition = agent.turn(Strategy::Exploit).unwrap();
        // all-zero row picks up, which is a wall
        assert!(transition.ran_into_wall);
        assert_eq!(agent.q_table().get(start, Movement::Up.index()), -5.0);
    }

    #[test]
    fn configure_changes_rewards_used_by_updates() {
        let mut agent = agent("####\n#SG#\n####", 3);
        agent.configure(vec![("DEATH_PENALTY", -20.0)]).unwrap();
        let start = agent.state();
        agent.turn(Strategy::Exploit).unwrap();
        assert_eq!(agent.q_table().get(start, Movement::Up.index()), -20.0);
        assert!(agent.configure(vec![("GAMMA", 0.1)]).is_err());
        assert_eq!(agent.config().death_penalty, -20.0);
    }

    #[test]
    fn rejects_non_finite_config() {
        let mut config = AgentConfig::default();
        config.learning_rate = f64::INFINITY;
        assert!(matches!(
            QAgent::with_seed("QAGENT", Maze::classic(), config, Some(1)),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn training_restores_narration_setting() {
        let mut agent = agent("####\n#SG#\n####", 5);
        assert!(!agent.maze().is_silent());
        agent.train(3, 1_000, &mut NoopObserver).unwrap();
        assert!(!agent.maze().is_silent());
    }

    #[test]
    fn report_counts_every_turn() {
        let mut agent = agent("#####\n#S.G#\n#####", 11);
        let report = agent.train(20, 100_000, &mut NoopObserver).unwrap();
        assert_eq!(report.episodes.len(), 20);
        let summed: u64 = report.episodes.iter().map(|e| e.turns).sum();
        assert_eq!(summed, report.total_turns);
        assert!(report.episodes.iter().all(|e| e.turns >= 2));
    }

    #[test]
    fn play_without_training_hits_turn_limit() {
        let mut agent = agent("#####\n#S.G#\n#####", 2);
        let outcome = agent.play(10).unwrap();
        assert!(!outcome.reached_goal());
        assert_eq!(outcome.turns(), 10);
        assert_eq!(outcome.path().len(), 10);
        assert_eq!(agent.maze().position(), agent.maze().start_pos());
    }

    #[test]
    fn play_follows_a_hand_written_table() {
        let mut agent = agent("#####\n#S.G#\n#####", 2);
        let codec = StateCodec::for_maze(agent.maze());
        agent.q_table.set(codec.encode(Pos::new(1, 1)), Movement::Right.index(), 1.0);
        agent.q_table.set(codec.encode(Pos::new(1, 2)), Movement::Right.index(), 1.0);
        let before = agent.q_table().clone();
        let outcome = agent.play(10).unwrap();
        assert_eq!(
            outcome,
            PlayOutcome::ReachedGoal {
                turns: 2,
                path: vec![Pos::new(1, 1), Pos::new(1, 2), Pos::new(1, 3)],
            }
        );
        assert_eq!(agent.q_table(), &before);
    }

    #[test]
    fn greedy_training_still_terminates_on_adjacent_goal() {
        let mut agent = agent("####\n#SG#\n####", 9).with_exploration(NoExploration);
        let report = agent.train(10, 1_000, &mut NoopObserver).unwrap();
        assert!(report.episodes.iter().all(|e| e.explored == 0));
    }

    #[test]
    fn history_is_written_as_csv() {
        let report = TrainingReport {
            episodes: vec![EpisodeStats {
                episode: 0,
                exploration_rate: 0.8,
                turns: 4,
                wall_hits: 1,
                explored: 3,
            }],
            total_turns: 4,
        };
        let mut buf = Vec::new();
        report.to_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "episode,exploration_rate,turns,wall_hits,explored\n0,0.8,4,1,3\n"
        );
    }
}
