use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use maze_q_learning::interactive::{play_interactive, SessionEnd};
use maze_q_learning::observers::{LoggingObserver, ProgressObserver, TrainingObserver};
use maze_q_learning::{AgentConfig, ConfigFile, Maze, PlayOutcome, QAgent, DEFAULT_AGENT_NAME};

#[derive(Parser)]
#[command(name = "maze-q-learning", about = "Q-learning agent for a grid maze")]
struct Cli {
    /// Log every episode and turn
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train an agent, then let it play once with what it learned
    Train(TrainArgs),
    /// Play the maze yourself
    Human(HumanArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// JSON file mapping agent names to hyperparameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Section of the config file to use
    #[arg(long, default_value = DEFAULT_AGENT_NAME)]
    agent: String,

    /// Maze layout file (`#` wall, `.` free, `S` start, `G` goal)
    #[arg(long)]
    maze: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    episodes: usize,

    /// Maximum number of turns over the whole training run
    #[arg(long, default_value_t = 100_000_000)]
    call_limit: u64,

    /// Maximum number of turns when playing the learned policy
    #[arg(long, default_value_t = 100)]
    play_limit: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Override a hyperparameter, e.g. `--set LEARNING_RATE=0.5`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    overrides: Vec<(String, f64)>,

    /// Write per-episode statistics to this CSV file
    #[arg(long)]
    history: Option<PathBuf>,

    #[arg(long)]
    no_progress: bool,
}

#[derive(Args)]
struct HumanArgs {
    #[arg(long)]
    maze: Option<PathBuf>,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {}: {}", key, e))?;
    Ok((key.trim().to_string(), value))
}

fn load_maze(path: Option<&PathBuf>) -> Result<Maze> {
    match path {
        Some(path) => {
            let layout = std::fs::read_to_string(path)
                .with_context(|| format!("reading maze {}", path.display()))?;
            layout
                .parse()
                .with_context(|| format!("parsing maze {}", path.display()))
        }
        None => Ok(Maze::classic()),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigFile::load(path)?.agent(&args.agent)?,
        None => AgentConfig::default(),
    };
    let maze = load_maze(args.maze.as_ref())?;

    let mut agent = QAgent::with_seed(args.agent.as_str(), maze, config, args.seed)?;
    agent
        .configure(args.overrides.iter().map(|(k, v)| (k.as_str(), *v)))
        .context("applying --set overrides")?;

    let mut observer: Box<dyn TrainingObserver> = if args.no_progress {
        Box::new(LoggingObserver::new(10))
    } else {
        Box::new(ProgressObserver::new())
    };
    let report = agent
        .train(args.episodes, args.call_limit, observer.as_mut())
        .context("training failed")?;

    if let Some(path) = &args.history {
        report.write_csv(path)?;
    }

    println!("{}", agent.greedy_policy().render(agent.maze()));

    match agent.play(args.play_limit)? {
        PlayOutcome::ReachedGoal { turns, path } => {
            let steps: Vec<String> = path.iter().map(|p| p.to_string()).collect();
            println!("Reached the goal in {} turns: {}", turns, steps.join(" -> "));
        }
        PlayOutcome::TurnLimitReached { turns, .. } => {
            println!("Call limit of {} reached. Policy does not appear to lead to target.", turns);
        }
    }
    Ok(())
}

fn human(args: HumanArgs) -> Result<()> {
    let mut maze = load_maze(args.maze.as_ref())?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match play_interactive(&mut maze, stdin.lock(), &mut stdout)? {
        SessionEnd::Won { turns } => println!("Solved in {} turns.", turns),
        SessionEnd::Quit | SessionEnd::InputClosed => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Train(args) => train(args),
        Command::Human(args) => human(args),
    }
}
