mod graph;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trialzone_config::load_experiment;
use trialzone_driver::{Driver, RunMode};

/// Converts heterogeneous reader streams into aligned trial records.
#[derive(Debug, Parser)]
#[command(name = "trialzone", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the full pipeline synchronously to completion and writes a
    /// trial file.
    Convert {
        #[arg(long)]
        experiment: PathBuf,
        #[arg(long)]
        subject: Option<PathBuf>,
        #[arg(long = "readers", value_name = "READER.ARG=VALUE")]
        readers: Vec<String>,
        #[arg(long)]
        trial_file: PathBuf,
        #[arg(long = "search-path", value_name = "DIR")]
        search_path: Vec<PathBuf>,
    },
    /// Runs the same driver with `simulate_delay` pacing active, printing
    /// trial/enhancement summaries in place of the out-of-scope plotting
    /// frontend.
    Gui {
        #[arg(long)]
        experiment: PathBuf,
        #[arg(long)]
        subject: Option<PathBuf>,
        #[arg(long = "readers", value_name = "READER.ARG=VALUE")]
        readers: Vec<String>,
        #[arg(long)]
        trial_file: PathBuf,
        #[arg(long = "search-path", value_name = "DIR")]
        search_path: Vec<PathBuf>,
        #[arg(long)]
        plot_positions: Option<PathBuf>,
    },
    /// Emits a Graphviz DOT file describing readers, buffers, the
    /// delimiter/WRT, enhancers/collecters, and the sink, without needing a
    /// real plugin loader.
    Graph {
        #[arg(long)]
        experiment: PathBuf,
        #[arg(long)]
        graph_file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            experiment,
            subject,
            readers,
            trial_file,
            search_path,
        } => run_convert(experiment, subject, readers, trial_file, search_path),
        Command::Gui {
            experiment,
            subject,
            readers,
            trial_file,
            search_path,
            plot_positions,
        } => run_gui(experiment, subject, readers, trial_file, search_path, plot_positions),
        Command::Graph { experiment, graph_file } => graph::run(&experiment, &graph_file),
    }
}

/// `load_experiment` only takes a single base directory for resolving
/// relative reader paths; when the CLI is given more than one
/// `--search-path`, the first is used and the rest are logged as ignored
/// rather than silently dropped.
fn first_search_path(search_path: &[PathBuf]) -> Option<&std::path::Path> {
    if search_path.len() > 1 {
        tracing::warn!(
            ignored = search_path.len() - 1,
            "multiple --search-path directories given; only the first is used"
        );
    }
    search_path.first().map(PathBuf::as_path)
}

fn run_convert(
    experiment: PathBuf,
    subject: Option<PathBuf>,
    readers: Vec<String>,
    trial_file: PathBuf,
    search_path: Vec<PathBuf>,
) -> Result<()> {
    let base = first_search_path(&search_path);
    let experiment = load_experiment(&experiment, subject.as_deref(), &readers, base)
        .context("failed to load experiment")?;
    let sink = trialzone_sink::open_sink(&trial_file).context("failed to open trial file")?;
    let mut driver = Driver::new(experiment, sink, RunMode::Convert);
    let summary = driver.run().context("run failed")?;
    info!(
        cycles = summary.cycles,
        trials = summary.trials_emitted,
        rewritten = summary.trials_rewritten,
        "convert finished"
    );
    Ok(())
}

fn run_gui(
    experiment: PathBuf,
    subject: Option<PathBuf>,
    readers: Vec<String>,
    trial_file: PathBuf,
    search_path: Vec<PathBuf>,
    plot_positions: Option<PathBuf>,
) -> Result<()> {
    if let Some(path) = &plot_positions {
        std::fs::metadata(path).with_context(|| format!("plot positions file '{}' is not readable", path.display()))?;
    }

    let base = first_search_path(&search_path);
    let experiment = load_experiment(&experiment, subject.as_deref(), &readers, base)
        .context("failed to load experiment")?;
    let sink = trialzone_sink::open_sink(&trial_file).context("failed to open trial file")?;
    let mut driver = Driver::new(experiment, sink, RunMode::Gui);
    let summary = driver.run().context("run failed")?;
    println!(
        "trials emitted: {}, rewritten: {}, cycles: {}",
        summary.trials_emitted, summary.trials_rewritten, summary.cycles
    );
    Ok(())
}
