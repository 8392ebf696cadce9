//! bracket-predictor - estimate placements in a double-elimination bracket

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use bracket_core::input::{self, BRACKET_PARAMS_FILE, INITIAL_BRACKET_FILE, PLAYER_DATA_FILE};
use bracket_core::report;
use bracket_core::{parse_trial_count, Bracket, MonteCarlo, MonteCarloConfig, TrialConfig};

#[derive(Parser)]
#[command(name = "bracket-predictor")]
#[command(version, about = "Monte Carlo placement predictor for double-elimination brackets", long_about = None)]
struct Cli {
    /// Number of simulated brackets (default 100000)
    trials: Option<String>,

    /// Bracket sizes, routing table and fixed results
    #[arg(long, default_value = BRACKET_PARAMS_FILE)]
    params: PathBuf,

    /// Competitor ratings
    #[arg(long, default_value = PLAYER_DATA_FILE)]
    players: PathBuf,

    /// Winners and losers entrants in seeding order
    #[arg(long, default_value = INITIAL_BRACKET_FILE)]
    seeding: PathBuf,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (defaults to the number of cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Keep ratings fixed within each trial
    #[arg(long)]
    no_rating_updates: bool,

    /// Order the report by average points instead of seeding
    #[arg(long)]
    sort: bool,

    /// Print standings as JSON
    #[arg(long)]
    json: bool,

    /// No progress bar or run summary
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(trials: u64, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(trials);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} trials ({eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

fn run(cli: Cli) -> Result<()> {
    let trials = parse_trial_count(cli.trials.as_deref())?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure worker threads")?;
    }

    let params = input::load_bracket_params(&cli.params).context("failed to load bracket parameters")?;
    let roster = input::load_roster(&cli.players).context("failed to load player data")?;
    let seeding = input::load_seeding(&cli.seeding).context("failed to load initial bracket")?;

    let config = TrialConfig {
        update_ratings: !cli.no_rating_updates,
        ..TrialConfig::default()
    };
    let mut bracket = Bracket::build(&params, roster, &seeding, config)?;

    let mc = MonteCarlo::new(MonteCarloConfig {
        trials,
        workers: cli.threads,
        seed: cli.seed,
    });
    let pb = progress_bar(trials, cli.quiet || cli.json)?;
    let summary = mc.run_with_progress(&mut bracket, |n| pb.inc(n))?;
    pb.finish_and_clear();

    let mut standings = report::standings(&bracket);
    if cli.sort {
        report::sort_by_points(&mut standings);
    }

    if cli.json {
        println!("{}", report::to_json(&standings)?);
        return Ok(());
    }

    println!("{}", report::render_table(&standings));
    if !cli.quiet {
        if !bracket.synthesized().is_empty() {
            println!(
                "{} {}",
                "Added with default rating:".yellow(),
                bracket.synthesized().join(", ")
            );
        }
        print!("{}", report::render_summary(&summary));
    }
    Ok(())
}

fn main() {
    init_logging();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("{} {:#}", "ERROR:".red().bold(), e);
        process::exit(1);
    }
}
