use mcgather::aggregators::{files, reduction};
use mcgather::artifacts::{self, REDUCTION_FILE};
use mcgather::callbacks::SimpleCallback;
use mcgather::config::RunConfig;
use mcgather::integrands::SinCosGauss;
use mcgather::jobs::{self, JobOutcome};
use mcgather::{Bounds, Error, Result};

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

const REPORT_FILE: &str = "monte_carlo_report.txt";

/// Scatter Monte Carlo integration jobs and gather their results.
#[derive(Parser)]
#[command(name = "mcgather", version, about)]
struct Cli {
    /// Maximum level of the log messages.
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    /// JSON file with the run configuration; flags take precedence over it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single job and write its result or error artifact.
    Job {
        /// Identifier of the job, unique within the run.
        job_id: u64,
        /// Number of samples.
        samples: Option<usize>,
        /// Integration domain, e.g. "[(-1,1),(-1,1)]".
        bounds: Option<String>,
        /// Base seed of the run.
        #[arg(long)]
        seed: Option<u64>,
        /// Directory that receives the artifact.
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Share one sample budget among concurrent ranks and combine their estimates.
    Reduce {
        /// Number of samples of all ranks together.
        samples_total: Option<usize>,
        /// Integration domain, e.g. "[(-1,1),(-1,1)]".
        bounds: Option<String>,
        /// Number of ranks.
        #[arg(long, default_value_t = 1)]
        ranks: usize,
        /// Base seed of the run.
        #[arg(long)]
        seed: Option<u64>,
        /// Directory that receives the combined record.
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Summarize the artifacts found in a result directory.
    Aggregate {
        /// Directory containing the artifacts.
        results_dir: Option<PathBuf>,
    },
}

fn parse_bounds(text: Option<&str>, config: &RunConfig) -> Result<Bounds<f64>> {
    text.map_or_else(|| config.bounds(), str::parse::<Bounds<f64>>)
}

fn job(
    config: &RunConfig,
    job_id: u64,
    samples: Option<usize>,
    bounds: Option<&str>,
    seed: Option<u64>,
    results_dir: Option<&Path>,
) -> Result<ExitCode> {
    let bounds = parse_bounds(bounds, config)?;
    let samples = samples.unwrap_or(config.samples);
    let seed = seed.unwrap_or(config.base_seed);
    let dir = results_dir.unwrap_or(config.results_dir.as_path());

    info!(job_id, samples, bounds = %bounds, "starting Monte Carlo job");

    let outcome = jobs::run_job(
        &SinCosGauss,
        &bounds,
        samples,
        seed,
        job_id,
        &SimpleCallback {},
    );
    let path = artifacts::write_outcome(dir, &outcome)?;

    info!(path = %path.display(), "artifact written");

    Ok(match outcome {
        JobOutcome::Completed(_) => ExitCode::SUCCESS,
        JobOutcome::Failed(_) => ExitCode::FAILURE,
    })
}

fn reduce(
    config: &RunConfig,
    samples_total: Option<usize>,
    bounds: Option<&str>,
    ranks: usize,
    seed: Option<u64>,
    results_dir: Option<&Path>,
) -> Result<ExitCode> {
    let bounds = parse_bounds(bounds, config)?;
    let samples_total = samples_total.unwrap_or(config.samples);
    let seed = seed.unwrap_or(config.base_seed);
    let dir = results_dir.unwrap_or(config.results_dir.as_path());

    let record = reduction::reduce(&SinCosGauss, &bounds, samples_total, seed, ranks)?;

    fs::create_dir_all(dir)?;
    artifacts::write_json(&dir.join(REDUCTION_FILE), &record)?;

    println!(
        "Final result: {:.6} \u{b1} {:.6}",
        record.value(),
        record.error()
    );
    println!(
        "Total computation time: {:.2} seconds",
        record.computation_time()
    );

    Ok(ExitCode::SUCCESS)
}

fn aggregate(config: &RunConfig, results_dir: Option<&Path>) -> Result<ExitCode> {
    let dir = results_dir.unwrap_or(config.results_dir.as_path());
    let collection = files::load_results::<f64>(dir)?;

    if !collection.failures().is_empty() {
        println!("Found {} failed jobs:", collection.failures().len());
        for failure in collection.failures() {
            println!("  Job {}: {}", failure.job_id(), failure.error());
        }
    }

    for path in collection.unreadable() {
        println!("  Could not read {}", path.display());
    }

    let summary = match collection.summarize() {
        Ok(summary) => summary,
        Err(err @ Error::AggregationInput { .. }) => {
            println!("No results found: {}", err);
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err),
    };

    println!("Loaded {} successful results", collection.results().len());
    println!("{}", "=".repeat(60));
    println!("MONTE CARLO RESULTS SUMMARY");
    println!("{}", "=".repeat(60));
    print!("{}", summary);

    let report = format!(
        "PARALLEL MONTE CARLO INTEGRATION REPORT\n{}\nGenerated: {}\n\nFailed jobs: {}\n\nSUMMARY:\n{}",
        "=".repeat(50),
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        collection.failures().len(),
        summary
    );
    let path = dir.join(REPORT_FILE);
    fs::write(&path, report)?;

    info!(path = %path.display(), "report written");

    Ok(ExitCode::SUCCESS)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    match cli.command {
        Command::Job {
            job_id,
            samples,
            bounds,
            seed,
            results_dir,
        } => job(
            &config,
            job_id,
            samples,
            bounds.as_deref(),
            seed,
            results_dir.as_deref(),
        ),
        Command::Reduce {
            samples_total,
            bounds,
            ranks,
            seed,
            results_dir,
        } => reduce(
            &config,
            samples_total,
            bounds.as_deref(),
            ranks,
            seed,
            results_dir.as_deref(),
        ),
        Command::Aggregate { results_dir } => aggregate(&config, results_dir.as_deref()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    run(cli).unwrap_or_else(|err| {
        error!(error = %err, "aborting");
        ExitCode::FAILURE
    })
}
