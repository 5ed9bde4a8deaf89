//! CLI for wildlern.
//!
//! Trains the card and maze agents against the headless environments, keeps
//! their Q-tables in snapshot files between runs and prints what a snapshot
//! has learned.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use wildlern_agents::{
    AgentKind, AgentSnapshot, CardAgent, CardAgentConfig, MazeAgent, MazeAgentConfig,
};
use wildlern_core::Agent;
use wildlern_sim::{train_cards, train_maze, CardTable, MazeBoard, NoisyOracle};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent, resuming from its snapshot if one exists
    Train {
        #[command(subcommand)]
        game: Game,
    },
    /// Summarise a snapshot file
    Inspect {
        /// Snapshot to read
        #[arg(long)]
        snapshot: PathBuf,
    },
}

#[derive(Subcommand)]
enum Game {
    /// Card-matching game (immediate reward)
    Cards {
        /// Number of hands to play
        #[arg(long, default_value = "10000")]
        turns: u64,

        /// Seed for agent, dealer and classifier
        #[arg(long)]
        seed: Option<u64>,

        /// Probability that an enemy card is misclassified
        #[arg(long, default_value = "0.0")]
        noise: f32,

        /// Number of recent hands averaged in the report
        #[arg(long, default_value = "1000")]
        window: usize,

        /// JSON file with agent hyperparameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the snapshot file
        #[arg(long, default_value = "data/wildlern.cards.snapshot.json")]
        snapshot: PathBuf,

        /// Path to the report file
        #[arg(long, default_value = "data/wildlern.cards.report.json")]
        report: PathBuf,
    },
    /// Grid maze (discounted bootstrap)
    Maze {
        /// Number of episodes to run
        #[arg(long, default_value = "500")]
        episodes: u64,

        /// Turn budget per episode
        #[arg(long, default_value = "100")]
        episode_turns: u32,

        /// Seed for the agent
        #[arg(long)]
        seed: Option<u64>,

        /// JSON file with agent hyperparameters (board size comes from the layout)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Text file with one row of cell digits per line (0 free, 1 breakable, 2 wall, 3 goal)
        #[arg(long)]
        layout: Option<PathBuf>,

        /// Path to the snapshot file
        #[arg(long, default_value = "data/wildlern.maze.snapshot.json")]
        snapshot: PathBuf,

        /// Path to the report file
        #[arg(long, default_value = "data/wildlern.maze.report.json")]
        report: PathBuf,
    },
}

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    serde_json::from_reader(file).with_context(|| format!("Failed to parse {:?}", path))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Reads a snapshot if the file exists and checks that it belongs to `expected`.
fn load_snapshot(path: &Path, expected: AgentKind) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let value: Value = load_json(path)?;
    let snapshot = AgentSnapshot::from_value(value.clone())?;
    if snapshot.kind != expected {
        anyhow::bail!(
            "Snapshot kind mismatch: expected {:?}, found {:?}",
            expected,
            snapshot.kind
        );
    }
    Ok(Some(value))
}

fn card_config(path: Option<&Path>) -> Result<CardAgentConfig> {
    let config = match path {
        Some(p) => load_json(p)?,
        None => CardAgentConfig::default(),
    };
    config.validate().context("Invalid card agent config")?;
    Ok(config)
}

fn maze_config(path: Option<&Path>, board: &MazeBoard) -> Result<MazeAgentConfig> {
    let base = match path {
        Some(p) => load_json(p)?,
        None => MazeAgentConfig::default(),
    };
    let config = board.agent_config(base);
    config.validate().context("Invalid maze agent config")?;
    Ok(config)
}

fn load_layout(path: Option<&Path>) -> Result<MazeBoard> {
    match path {
        Some(p) => {
            let text =
                fs::read_to_string(p).with_context(|| format!("Failed to read layout {:?}", p))?;
            let rows: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            Ok(MazeBoard::from_layout(&rows)?)
        }
        None => Ok(MazeBoard::default()),
    }
}

fn run_cards(
    turns: u64,
    seed: Option<u64>,
    noise: f32,
    window: usize,
    config: Option<&Path>,
    snapshot: &Path,
    report: &Path,
) -> Result<()> {
    let config = card_config(config)?;
    let mut agent = CardAgent::new(config.clone())?;
    let mut table = CardTable::for_agent(&config)?;
    let mut oracle = NoisyOracle::new(config.num_classes, noise)?;
    if let Some(seed) = seed {
        agent = agent.with_seed(seed);
        table = table.with_seed(seed.wrapping_add(1));
        oracle = oracle.with_seed(seed.wrapping_add(2));
    }

    if let Some(snap) = load_snapshot(snapshot, AgentKind::Cards)? {
        agent.load(snap).context("Failed to restore card snapshot")?;
        println!("Resuming from snapshot {:?} (epsilon {:.3})", snapshot, agent.epsilon());
    }

    println!("Training card agent for {} turns (started {})", turns, iso8601_now());
    let summary = train_cards(&mut agent, &mut table, &oracle, turns, window)?;

    save_json(snapshot, &agent.snapshot()).context("Failed to save snapshot")?;
    save_json(report, &summary).context("Failed to save report")?;
    println!(
        "Won {} / lost {} / tie {} / invalid {}.",
        summary.tally.won,
        summary.tally.lost,
        summary.tally.tie,
        summary.tally.invalid
    );
    println!(
        "Average reward {:.3}, last {} hands {:.3}, epsilon {:.3}",
        summary.average_reward,
        summary.window,
        summary.recent_average_reward,
        summary.final_epsilon
    );
    Ok(())
}

fn run_maze(
    episodes: u64,
    episode_turns: u32,
    seed: Option<u64>,
    config: Option<&Path>,
    layout: Option<&Path>,
    snapshot: &Path,
    report: &Path,
) -> Result<()> {
    let mut board = load_layout(layout)?;
    let config = maze_config(config, &board)?;
    let mut agent = MazeAgent::new(config)?;
    if let Some(seed) = seed {
        agent = agent.with_seed(seed);
    }

    if let Some(snap) = load_snapshot(snapshot, AgentKind::Maze)? {
        agent.load(snap).context("Failed to restore maze snapshot")?;
        println!("Resuming from snapshot {:?} (epsilon {:.3})", snapshot, agent.epsilon());
    }

    println!(
        "Training maze agent for {} episodes of at most {} turns (started {})",
        episodes,
        episode_turns,
        iso8601_now()
    );
    let summary = train_maze(&mut agent, &mut board, episodes, episode_turns)?;

    save_json(snapshot, &agent.snapshot()).context("Failed to save snapshot")?;
    save_json(report, &summary).context("Failed to save report")?;
    println!(
        "Goal reached in {} of {} episodes. Average reward {:.3}, epsilon {:.3}",
        summary.goals, summary.episodes, summary.average_reward, summary.final_epsilon
    );
    Ok(())
}

/// Per action, the number of states whose greedy choice it is. Rows still at
/// their initial zeros are left out.
fn greedy_histogram(snapshot: &AgentSnapshot) -> Result<Vec<usize>> {
    let table = &snapshot.q_table;
    let mut counts = vec![0; table.num_actions()];
    for state in 0..table.num_states() {
        let mut touched = false;
        for action in 0..table.num_actions() {
            if table.get(state, action)? != 0.0 {
                touched = true;
                break;
            }
        }
        if touched {
            counts[table.best_action(state)?] += 1;
        }
    }
    Ok(counts)
}

fn inspect(path: &Path) -> Result<()> {
    let value: Value = load_json(path)?;
    let snapshot = AgentSnapshot::from_value(value).context("Not a wildlern snapshot")?;
    println!("kind: {:?}", snapshot.kind);
    println!("saved_at: {}", snapshot.saved_at);
    println!(
        "q_table: {} states x {} actions",
        snapshot.q_table.num_states(),
        snapshot.q_table.num_actions()
    );
    println!("epsilon: {:.4} after {} steps", snapshot.epsilon, snapshot.steps);
    let histogram = greedy_histogram(&snapshot)?;
    let visited: usize = histogram.iter().sum();
    println!("visited states: {}", visited);
    for (action, count) in histogram.iter().enumerate().filter(|(_, &c)| c > 0) {
        println!("  action {:>3}: greedy in {} states", action, count);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train { game } => match game {
            Game::Cards {
                turns,
                seed,
                noise,
                window,
                config,
                snapshot,
                report,
            } => run_cards(
                turns,
                seed,
                noise,
                window,
                config.as_deref(),
                &snapshot,
                &report,
            ),
            Game::Maze {
                episodes,
                episode_turns,
                seed,
                config,
                layout,
                snapshot,
                report,
            } => run_maze(
                episodes,
                episode_turns,
                seed,
                config.as_deref(),
                layout.as_deref(),
                &snapshot,
                &report,
            ),
        },
        Commands::Inspect { snapshot } => inspect(&snapshot),
    }
}
