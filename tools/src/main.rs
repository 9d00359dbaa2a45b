//! populate: fill a directory with one synthetic user's documents,
//! browser traces, credentials and application footprints.
//!
//! Usage:
//!   populate ./sandbox --seed 12345
//!   populate --config run.json --now 2025-06-15T12:00:00 --json

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use populator_core::{
    config::RunConfig,
    pipeline::{self, RunSummary},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "populate",
    version,
    about = "Populate a sandbox user profile with consistent synthetic artifacts"
)]
struct Cli {
    /// Target home directory. Defaults to USERPROFILE / HOME.
    target: Option<PathBuf>,

    /// JSON run configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Master seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Reference time, YYYY-MM-DDTHH:MM:SS (overrides the config file)
    #[arg(long, value_parser = parse_now)]
    now: Option<NaiveDateTime>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_now(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SS: {e}"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => RunConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.now.is_some() {
        config.reference_time = cli.now;
    }
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!("populate: {}", summary.run_id);
    println!("  seed:      {}", summary.seed);
    println!("  now:       {}", summary.reference_time.format("%Y-%m-%d %H:%M:%S"));
    println!("  home:      {}", summary.home.display());
    println!("  persona:   {} <{}>", summary.persona, summary.email);
    println!("  username:  {}", summary.username);
    println!("  created:   {}", summary.account_created);
    println!();
    for (category, files) in &summary.files_per_category {
        println!("  {:<12} {files:>5} files", category.name());
    }
    println!();
    println!(
        "  total:     {} files, {} bytes, {} ledger facts",
        summary.files_written, summary.bytes_written, summary.ledger_facts
    );
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("populate: {e:#}");
            std::process::exit(2);
        }
    };

    match pipeline::run(cli.target.as_deref(), &config) {
        Ok(summary) => {
            if cli.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("populate: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                print_summary(&summary);
            }
        }
        Err(e) => {
            log::error!("run aborted: {e}");
            eprintln!("populate: {e}");
            std::process::exit(pipeline::exit_code(&e));
        }
    }
}
