//! Configuration management module
//!
//! Handles loading, saving, and validation of the runner configuration:
//! where the benchmark binary and manifest live, where results go, and the
//! policies applied to each benchmark invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    RunnerError, Result, APP_NAME, CONFIG_FILE, DEFAULT_BINARY_PATH, DEFAULT_MANIFEST_PATH,
    DEFAULT_RESULTS_DIR, HISTORY_FILE, RESULT_EXTENSION, STDERR_DIR,
};

pub mod persistence;

/// Runner configuration structure containing all run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// External benchmark executable, invoked as `<binary> <name>`
    pub binary_path: PathBuf,
    /// Text file listing one benchmark name per line
    pub manifest_path: PathBuf,
    /// Directory receiving `<name>.txt` result files
    pub results_dir: PathBuf,
    /// What to do when a benchmark does not exit successfully
    pub failure_policy: FailurePolicy,
    /// Where the benchmark's standard error goes
    pub stderr_mode: StderrMode,
    /// Optional wall-clock limit per benchmark
    #[serde(
        with = "timeout_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    /// Create the results directory if it is missing
    pub create_results_dir: bool,
    /// Append a report of every run to the history file
    pub record_history: bool,
    /// Override for the history file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
}

/// Reaction to a benchmark that failed, crashed, timed out or could not start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the outcome and move on to the next benchmark
    #[default]
    ContinueOnError,
    /// Record the outcome and skip the remaining benchmarks
    StopOnError,
}

/// Destination of the benchmark's standard error stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StderrMode {
    /// Share the runner's own standard error
    #[default]
    Inherit,
    /// Discard it
    Null,
    /// Write it to `<results_dir>/stderr/<name>.txt`
    File,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from(DEFAULT_BINARY_PATH),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            failure_policy: FailurePolicy::default(),
            stderr_mode: StderrMode::default(),
            timeout: None,
            create_results_dir: true,
            record_history: true,
            history_path: None,
        }
    }
}

impl RunnerConfig {
    /// Create a new runner configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.binary_path.as_os_str().is_empty() {
            return Err(RunnerError::Config(
                "Binary path must not be empty".to_string(),
            ));
        }

        if self.manifest_path.as_os_str().is_empty() {
            return Err(RunnerError::Config(
                "Manifest path must not be empty".to_string(),
            ));
        }

        if self.results_dir.as_os_str().is_empty() {
            return Err(RunnerError::Config(
                "Results directory must not be empty".to_string(),
            ));
        }

        if self.results_dir.exists() && !self.results_dir.is_dir() {
            return Err(RunnerError::Config(format!(
                "Results path is not a directory: {}",
                self.results_dir.display()
            )));
        }

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(RunnerError::Config(
                    "Timeout must be greater than 0".to_string(),
                ));
            }
        }

        if let Some(path) = &self.history_path {
            if path.as_os_str().is_empty() {
                return Err(RunnerError::Config(
                    "History path must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Set the benchmark binary
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Set the manifest file
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Set the results directory
    pub fn with_results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_dir = path.into();
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the stderr handling
    pub fn with_stderr_mode(mut self, mode: StderrMode) -> Self {
        self.stderr_mode = mode;
        self
    }

    /// Set the per-benchmark timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set whether a missing results directory is created
    pub fn with_create_results_dir(mut self, create: bool) -> Self {
        self.create_results_dir = create;
        self
    }

    /// Set whether runs are recorded in the history file
    pub fn with_record_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    /// Set an explicit history file location
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Path of the result file for a benchmark name
    pub fn result_path(&self, name: &str) -> PathBuf {
        self.results_dir
            .join(format!("{}.{}", name, RESULT_EXTENSION))
    }

    /// Directory holding captured stderr files, kept apart from result files
    pub fn stderr_dir(&self) -> PathBuf {
        self.results_dir.join(STDERR_DIR)
    }

    /// Path of the captured stderr file for a benchmark name
    pub fn stderr_path(&self, name: &str) -> PathBuf {
        self.stderr_dir()
            .join(format!("{}.{}", name, RESULT_EXTENSION))
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RunnerError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            RunnerError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RunnerError::Config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(path, content).map_err(|e| {
            RunnerError::Config(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/cache-bench-runner/cache-bench-runner.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            RunnerError::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// History file for this configuration: the explicit override, or
    /// $DATA_HOME/cache-bench-runner/history.json
    pub fn history_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir().ok_or_else(|| {
            RunnerError::Config("Unable to determine data directory".to_string())
        })?;

        Ok(data_dir.join(APP_NAME).join(HISTORY_FILE))
    }
}

impl FailurePolicy {
    /// Whether the run goes on after a benchmark that did not succeed
    pub fn continues_after_failure(&self) -> bool {
        matches!(self, FailurePolicy::ContinueOnError)
    }

    /// Get a human-readable description of the policy
    pub fn description(&self) -> &'static str {
        match self {
            FailurePolicy::ContinueOnError => "continue-on-error",
            FailurePolicy::StopOnError => "stop-on-error",
        }
    }
}

// Durations are written as humantime strings ("30s", "1m 30s")
mod timeout_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match timeout {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
