//! Tabular Q-learning on a small walled grid maze.
//!
//! A [`QAgent`] owns a [`Maze`] and learns, turn by turn, which of the four
//! movements leads it from the start cell to the goal.

pub mod agent;
pub mod codec;
pub mod config;
pub mod environment;
pub mod error;
pub mod interactive;
pub mod observers;
pub mod policy;
pub mod q_table;
pub mod rl;

pub use agent::{EpisodeStats, PlayOutcome, QAgent, TrainingReport, DEFAULT_AGENT_NAME};
pub use config::{AgentConfig, ConfigFile, ConfigKey};
pub use environment::{Cell, Maze, Movement, Pos, Transition};
pub use error::{Error, Result};
pub use q_table::QTable;
