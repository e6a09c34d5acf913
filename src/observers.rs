//! Hooks for watching a training run without touching the learning itself.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::agent::{EpisodeStats, TrainingReport};
use crate::error::{Error, Result};

pub trait TrainingObserver {
    fn on_training_start(&mut self, _num_episodes: usize) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _stats: &EpisodeStats) -> Result<()> {
        Ok(())
    }

    fn on_training_end(&mut self, _report: &TrainingReport) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl TrainingObserver for NoopObserver {}

/// Progress bar over episodes.
#[derive(Default)]
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainingObserver for ProgressObserver {
    fn on_training_start(&mut self, num_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(num_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, stats: &EpisodeStats) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
            pb.set_message(format!("eps {:.3}, {} turns", stats.exploration_rate, stats.turns));
        }
        Ok(())
    }

    fn on_training_end(&mut self, report: &TrainingReport) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_with_message(format!("{} turns total", report.total_turns));
        }
        Ok(())
    }
}

/// Logs a summary line every `every` episodes.
#[derive(Debug)]
pub struct LoggingObserver {
    every: usize,
}

impl LoggingObserver {
    pub fn new(every: usize) -> Self {
        Self { every: every.max(1) }
    }
}

impl TrainingObserver for LoggingObserver {
    fn on_episode_end(&mut self, stats: &EpisodeStats) -> Result<()> {
        if (stats.episode + 1) % self.every == 0 {
            info!(
                episode = stats.episode,
                epsilon = stats.exploration_rate,
                turns = stats.turns,
                wall_hits = stats.wall_hits,
                "episode finished"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_observer_runs_through_a_training_lifecycle() {
        let mut observer = ProgressObserver::new();
        observer.on_training_start(2).unwrap();
        let stats = EpisodeStats {
            episode: 0,
            exploration_rate: 0.5,
            turns: 3,
            wall_hits: 1,
            explored: 2,
        };
        observer.on_episode_end(&stats).unwrap();
        let report = TrainingReport {
            episodes: vec![stats],
            total_turns: 3,
        };
        observer.on_training_end(&report).unwrap();
        assert!(observer.progress_bar.is_none());
    }

    #[test]
    fn logging_interval_is_at_least_one() {
        assert_eq!(LoggingObserver::new(0).every, 1);
    }
}
