//! cache-bench-runner - sequential benchmark harness
//!
//! Runs an external benchmark binary once per name listed in a manifest,
//! capturing each run's standard output into its own result file.

use std::path::PathBuf;

// Public re-exports
pub mod bench;
pub mod cli;
pub mod config;
pub mod console;
pub mod manifest;
pub mod models;
pub mod util;

// Common error types
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    Config(String),
    /// Manifest could not be read
    #[error("Cannot read manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Manifest entry is not usable as a result filename stem
    #[error("Invalid benchmark name on manifest line {line}: {reason}")]
    InvalidName { line: usize, reason: String },
    /// Result file could not be created
    #[error("Cannot create result file {}: {source}", path.display())]
    ResultFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Run history persistence error
    #[error("Run history error: {0}")]
    History(String),
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        RunnerError::History(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for RunnerError {
    fn from(err: toml::de::Error) -> Self {
        RunnerError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for RunnerError {
    fn from(err: toml::ser::Error) -> Self {
        RunnerError::Config(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Error handling utilities
pub mod error {
    use super::RunnerError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &RunnerError) -> String {
        match error {
            RunnerError::Manifest { path, .. } => format!(
                "Benchmark manifest {} could not be read. Create it with one benchmark name per line or pass --manifest.",
                path.display()
            ),
            RunnerError::InvalidName { line, reason } => format!(
                "Manifest line {} is not a usable benchmark name ({}). Names become file names and must not contain path separators.",
                line, reason
            ),
            RunnerError::ResultFile { path, .. } => format!(
                "Could not create {}. Check that the results directory exists and is writable.",
                path.display()
            ),
            RunnerError::Config(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            RunnerError::History(_) => {
                "Failed to save run history. Check disk space and permissions, or pass --no-history."
                    .to_string()
            }
            RunnerError::Io(_) => error.to_string(),
        }
    }

    /// Whether the error happened before any benchmark could start
    pub fn is_setup_error(error: &RunnerError) -> bool {
        matches!(
            error,
            RunnerError::Config(_) | RunnerError::Manifest { .. } | RunnerError::InvalidName { .. }
        )
    }
}

// Common types and constants
pub const APP_NAME: &str = "cache-bench-runner";
pub const CONFIG_FILE: &str = "cache-bench-runner.toml";
pub const HISTORY_FILE: &str = "history.json";
pub const MAX_HISTORY: usize = 100;
pub const RESULT_EXTENSION: &str = "txt";
pub const STDERR_DIR: &str = "stderr";
pub const DEFAULT_BINARY_PATH: &str = "./bin/Release/cache-effect-benchmarks";
pub const DEFAULT_MANIFEST_PATH: &str = "benchmark_list.txt";
pub const DEFAULT_RESULTS_DIR: &str = "results";
