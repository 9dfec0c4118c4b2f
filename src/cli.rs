//! CLI argument parsing

use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

use crate::config::{FailurePolicy, RunnerConfig, StderrMode};
use crate::Result;

#[derive(Parser, Debug)]
#[command(name = "cache-bench-runner")]
#[command(version)]
#[command(
    about = "Run an external benchmark binary once per manifest entry, capturing each run's output",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,

    // used when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every benchmark in the manifest (default)
    Run(RunArgs),
    /// Show reports of previous runs
    History(HistoryArgs),
    /// Delete the run history
    ClearHistory(HistoryLocation),
}

impl Cli {
    /// The selected command, `run` when none was given.
    ///
    /// Run flags placed before an explicit subcommand are an error rather
    /// than silently ignored.
    pub fn into_command(self) -> std::result::Result<Command, clap::Error> {
        match self.command {
            None => Ok(Command::Run(self.run)),
            Some(command) if self.run == RunArgs::default() => Ok(command),
            Some(_) => Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "run options must follow the subcommand (e.g. `run --binary PATH`)",
            )),
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Benchmark executable, invoked as `<binary> <name>`
    #[arg(short, long, value_name = "PATH")]
    pub binary: Option<PathBuf>,

    /// File listing one benchmark name per line
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory receiving `<name>.txt` result files
    #[arg(short, long = "results-dir", value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Skip the remaining benchmarks after the first one that fails
    #[arg(long)]
    pub stop_on_error: bool,

    /// Where benchmark stderr goes
    #[arg(long, value_enum, value_name = "MODE")]
    pub stderr: Option<StderrMode>,

    /// Kill a benchmark that runs longer than this (e.g. "90s", "5m")
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Fail instead of creating a missing results directory
    #[arg(long)]
    pub no_create_results_dir: bool,

    /// Do not record this run in the history file
    #[arg(long)]
    pub no_history: bool,

    /// History file to record into
    #[arg(long, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    /// Do not draw the progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

impl RunArgs {
    /// Configuration file values with command-line overrides applied
    pub fn resolve_config(&self) -> Result<RunnerConfig> {
        let mut config = load_base_config(self.config.as_ref())?;

        if let Some(binary) = &self.binary {
            config.binary_path = binary.clone();
        }
        if let Some(manifest) = &self.manifest {
            config.manifest_path = manifest.clone();
        }
        if let Some(results_dir) = &self.results_dir {
            config.results_dir = results_dir.clone();
        }
        if self.stop_on_error {
            config.failure_policy = FailurePolicy::StopOnError;
        }
        if let Some(mode) = self.stderr {
            config.stderr_mode = mode;
        }
        if self.timeout.is_some() {
            config.timeout = self.timeout;
        }
        if self.no_create_results_dir {
            config.create_results_dir = false;
        }
        if self.no_history {
            config.record_history = false;
        }
        if let Some(path) = &self.history_file {
            config.history_path = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct HistoryLocation {
    /// Configuration file naming the history location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// History file, overriding the configuration
    #[arg(long, value_name = "FILE")]
    pub history_file: Option<PathBuf>,
}

impl HistoryLocation {
    pub fn resolve_config(&self) -> Result<RunnerConfig> {
        let mut config = load_base_config(self.config.as_ref())?;
        if let Some(path) = &self.history_file {
            config.history_path = Some(path.clone());
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Number of most recent runs to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Print the full reports as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub location: HistoryLocation,
}

fn load_base_config(path: Option<&PathBuf>) -> Result<RunnerConfig> {
    match path {
        Some(path) => RunnerConfig::load_from(path),
        None => RunnerConfig::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    fn empty_config_file() -> (TempDir, String) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("runner.toml");
        std::fs::write(&path, "").unwrap();
        let path = path.to_string_lossy().into_owned();
        (temp_dir, path)
    }

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = parse(&["cache-bench-runner", "--binary", "./stub", "--stop-on-error"]);
        match cli.into_command().unwrap() {
            Command::Run(args) => {
                assert_eq!(args.binary, Some(PathBuf::from("./stub")));
                assert!(args.stop_on_error);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_overrides_config() {
        let (_dir, config_path) = empty_config_file();
        let cli = parse(&[
            "cache-bench-runner",
            "run",
            "--config",
            &config_path,
            "--manifest",
            "list.txt",
            "--results-dir",
            "out",
            "--stderr",
            "file",
            "--timeout",
            "2m",
            "--no-history",
        ]);

        let Command::Run(args) = cli.into_command().unwrap() else {
            panic!("expected run command");
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(config.manifest_path, PathBuf::from("list.txt"));
        assert_eq!(config.results_dir, PathBuf::from("out"));
        assert_eq!(config.stderr_mode, StderrMode::File);
        assert_eq!(config.timeout, Some(Duration::from_secs(120)));
        assert!(!config.record_history);
        assert_eq!(config.failure_policy, FailurePolicy::ContinueOnError);
        assert_eq!(
            config.binary_path,
            PathBuf::from("./bin/Release/cache-effect-benchmarks")
        );
    }

    #[test]
    fn test_history_command() {
        let cli = parse(&["cache-bench-runner", "-v", "history", "-n", "3", "--json"]);
        assert_eq!(cli.verbose, 1);
        match cli.into_command().unwrap() {
            Command::History(args) => {
                assert_eq!(args.limit, 3);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_flags_before_subcommand_rejected() {
        let cli = parse(&["cache-bench-runner", "--binary", "./x", "run"]);
        let err = cli.into_command().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let cli = parse(&["cache-bench-runner", "--stop-on-error", "history"]);
        assert!(cli.into_command().is_err());

        let cli = parse(&["cache-bench-runner", "run", "--binary", "./x"]);
        assert!(cli.into_command().is_ok());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        assert!(Cli::try_parse_from(["cache-bench-runner", "--timeout", "later"]).is_err());
    }
}
