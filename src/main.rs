use anyhow::{Context, Result};
use cache_bench_runner::bench::SequentialRunner;
use cache_bench_runner::cli::{Cli, Command, HistoryArgs, HistoryLocation, RunArgs};
use cache_bench_runner::config::persistence::RunHistory;
use cache_bench_runner::{console, error, RunnerError};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; logs go to stderr so stdout carries only
/// the benchmark notices and summary
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn friendly(err: RunnerError) -> anyhow::Error {
    let hint = error::user_friendly_message(&err);
    anyhow::Error::new(err).context(hint)
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.resolve_config().map_err(friendly)?;
    let runner = SequentialRunner::new(config).map_err(friendly)?;

    // Nothing is created before the manifest has been read
    let manifest = runner.load_manifest().map_err(friendly)?;

    let report = console::run_with_progress(&runner, &manifest, !args.no_progress_bar)
        .await
        .map_err(friendly)?;
    console::print_report(&report);

    if runner.config().record_history {
        let recorded = RunHistory::for_config(runner.config())
            .and_then(|history| history.append(report));
        if let Err(e) = recorded {
            tracing::warn!("{}", error::user_friendly_message(&e));
        }
    }

    Ok(())
}

fn show_history(args: &HistoryArgs) -> Result<()> {
    let config = args.location.resolve_config().map_err(friendly)?;
    let history = RunHistory::for_config(&config).map_err(friendly)?;
    let reports = history.recent(args.limit).map_err(friendly)?;

    if args.json {
        let json = serde_json::to_string_pretty(&reports).context("serializing run history")?;
        println!("{}", json);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No runs recorded in {}", history.path().display());
        return Ok(());
    }

    for report in &reports {
        println!("{}", report.summary());
        for outcome in report.failures() {
            println!("{}", console::outcome_line(outcome));
        }
    }
    Ok(())
}

fn clear_history(location: &HistoryLocation) -> Result<()> {
    let config = location.resolve_config().map_err(friendly)?;
    let history = RunHistory::for_config(&config).map_err(friendly)?;
    history.clear().map_err(friendly)?;
    println!("Cleared {}", history.path().display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.into_command().unwrap_or_else(|e| e.exit());

    match command {
        Command::Run(args) => run(args).await,
        Command::History(args) => show_history(&args),
        Command::ClearHistory(location) => clear_history(&location),
    }
}
