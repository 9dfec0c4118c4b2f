//! Benchmark run data models
//!
//! Contains structures recording how each benchmark invocation ended and
//! the report describing a whole run, serializable for the run history.

use crate::config::RunnerConfig;
use crate::util::units::format_duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// How one invocation of the benchmark binary ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// Exited with status 0
    Success,
    /// Exited with a non-zero status
    Failed { code: i32 },
    /// Terminated by a signal
    Signaled { signal: i32 },
    /// Killed after exceeding the configured timeout
    TimedOut {
        #[serde(with = "duration_serde")]
        after: Duration,
    },
    /// The binary could not be started at all
    SpawnFailed { reason: String },
}

/// Record of one benchmark invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    /// Benchmark name as given in the manifest
    pub name: String,
    /// Position in the manifest (0-based, blank lines excluded)
    pub index: usize,
    /// File holding the benchmark's standard output
    pub result_path: PathBuf,
    /// How the process ended
    pub exit: ExitOutcome,
    /// When the invocation started
    pub started_at: DateTime<Utc>,
    /// Wall-clock time from spawn to exit
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Size of the result file after the process exited
    pub bytes_captured: u64,
}

/// Complete report of one harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the run started
    pub timestamp: DateTime<Utc>,
    /// Configuration used for this run
    pub config: RunnerConfig,
    /// Outcomes in manifest order
    pub outcomes: Vec<BenchmarkOutcome>,
    /// Number of benchmarks listed in the manifest
    pub planned: usize,
    /// Whether the failure policy ended the run before the manifest was exhausted
    pub stopped_early: bool,
    /// Total wall-clock time of the run
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// System information at time of run
    pub system_info: SystemInfo,
}

/// System information captured at run time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name and architecture
    pub os: String,
    /// CPU model
    pub cpu: String,
    /// Logical CPUs available
    pub cpu_count: usize,
    /// Total system memory in bytes
    pub memory_total: u64,
}

impl ExitOutcome {
    /// Classify a finished process
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return if code == 0 {
                ExitOutcome::Success
            } else {
                ExitOutcome::Failed { code }
            };
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled { signal };
            }
        }

        ExitOutcome::Failed { code: -1 }
    }

    /// Check if the benchmark exited cleanly
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }

    /// Short human-readable description
    pub fn description(&self) -> String {
        match self {
            ExitOutcome::Success => "ok".to_string(),
            ExitOutcome::Failed { code } => format!("exit code {}", code),
            ExitOutcome::Signaled { signal } => format!("killed by signal {}", signal),
            ExitOutcome::TimedOut { after } => format!("timed out after {}", format_duration(*after)),
            ExitOutcome::SpawnFailed { reason } => format!("failed to start: {}", reason),
        }
    }
}

impl RunReport {
    /// Start a report for a run of `planned` benchmarks
    pub fn new(config: RunnerConfig, planned: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            config,
            outcomes: Vec::with_capacity(planned),
            planned,
            stopped_early: false,
            elapsed: Duration::ZERO,
            system_info: SystemInfo::detect(),
        }
    }

    /// Number of benchmarks that exited cleanly
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.exit.is_success()).count()
    }

    /// Outcomes that did not exit cleanly
    pub fn failures(&self) -> impl Iterator<Item = &BenchmarkOutcome> {
        self.outcomes.iter().filter(|o| !o.exit.is_success())
    }

    /// Benchmarks listed in the manifest but never started
    pub fn skipped(&self) -> usize {
        self.planned.saturating_sub(self.outcomes.len())
    }

    /// Check if every planned benchmark ran and succeeded
    pub fn all_succeeded(&self) -> bool {
        self.skipped() == 0 && self.succeeded() == self.outcomes.len()
    }

    /// Get a human-readable summary of the run
    pub fn summary(&self) -> String {
        let failed = self.outcomes.len() - self.succeeded();
        let mut line = format!(
            "{} - {}/{} benchmarks ok, {} failed",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.succeeded(),
            self.planned,
            failed
        );
        if self.skipped() > 0 {
            line.push_str(&format!(", {} skipped", self.skipped()));
        }
        line.push_str(&format!(" - {}", format_duration(self.elapsed)));
        line
    }
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: detect_os(),
            cpu: detect_cpu(),
            cpu_count: detect_cpu_count(),
            memory_total: detect_memory_total(),
        }
    }
}

impl SystemInfo {
    /// Create system info by detecting current system
    pub fn detect() -> Self {
        Self::default()
    }
}

// Helper functions for system detection
fn detect_os() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

fn detect_cpu() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            if let Some(model) = parse_proc_field(&cpuinfo, "model name") {
                return model;
            }
        }
    }
    "Unknown CPU".to_string()
}

fn detect_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn detect_memory_total() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
            // "MemTotal:       16314460 kB"
            if let Some(kib) = parse_proc_field(&meminfo, "MemTotal")
                .and_then(|v| v.split_whitespace().next().map(str::to_string))
                .and_then(|v| v.parse::<u64>().ok())
            {
                return kib * 1024;
            }
        }
    }
    0
}

/// Value of the first `key: value` line in a /proc style listing
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_proc_field(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        (k.trim() == key).then(|| v.trim().to_string())
    })
}

// Durations are whole nanoseconds as u64; internally tagged enums cannot hold u128
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_outcome(name: &str, index: usize, exit: ExitOutcome) -> BenchmarkOutcome {
        BenchmarkOutcome {
            name: name.to_string(),
            index,
            result_path: PathBuf::from("results").join(format!("{}.txt", name)),
            exit,
            started_at: Utc::now(),
            elapsed: Duration::from_millis(250),
            bytes_captured: 42,
        }
    }

    fn create_report() -> RunReport {
        let mut report = RunReport::new(RunnerConfig::default(), 4);
        report.outcomes.push(create_outcome("matrix_mul", 0, ExitOutcome::Success));
        report
            .outcomes
            .push(create_outcome("list_traverse", 1, ExitOutcome::Failed { code: 3 }));
        report.outcomes.push(create_outcome(
            "branch_if",
            2,
            ExitOutcome::SpawnFailed {
                reason: "No such file or directory".to_string(),
            },
        ));
        report.elapsed = Duration::from_secs(12);
        report
    }

    #[test]
    fn test_report_counts() {
        let report = create_report();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failures().count(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_report_summary() {
        let summary = create_report().summary();
        assert!(summary.contains("1/4 benchmarks ok"));
        assert!(summary.contains("2 failed"));
        assert!(summary.contains("1 skipped"));
        assert!(summary.contains("12s"));
    }

    #[test]
    fn test_empty_report_all_succeeded() {
        let report = RunReport::new(RunnerConfig::default(), 0);
        assert!(report.all_succeeded());
        assert_eq!(report.skipped(), 0);
    }

    #[test]
    fn test_exit_outcome_description() {
        assert_eq!(ExitOutcome::Success.description(), "ok");
        assert_eq!(ExitOutcome::Failed { code: 2 }.description(), "exit code 2");
        assert_eq!(
            ExitOutcome::Signaled { signal: 9 }.description(),
            "killed by signal 9"
        );
        assert!(ExitOutcome::TimedOut {
            after: Duration::from_secs(5)
        }
        .description()
        .contains("timed out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_outcome_from_status() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(
            ExitOutcome::from_status(ExitStatus::from_raw(0)),
            ExitOutcome::Success
        );
        // wait(2) encoding: exit code in the high byte
        assert_eq!(
            ExitOutcome::from_status(ExitStatus::from_raw(3 << 8)),
            ExitOutcome::Failed { code: 3 }
        );
        assert_eq!(
            ExitOutcome::from_status(ExitStatus::from_raw(9)),
            ExitOutcome::Signaled { signal: 9 }
        );
    }

    #[test]
    fn test_serde_serialization() {
        let report = create_report();

        let json = serde_json::to_string(&report).expect("Failed to serialize to JSON");
        assert!(json.contains("\"kind\":\"spawn_failed\""));

        let deserialized: RunReport =
            serde_json::from_str(&json).expect("Failed to deserialize from JSON");
        assert_eq!(deserialized.outcomes.len(), 3);
        assert_eq!(deserialized.outcomes[1].exit, ExitOutcome::Failed { code: 3 });
        assert_eq!(deserialized.elapsed, report.elapsed);
        assert_eq!(deserialized.timestamp, report.timestamp);
        assert_eq!(deserialized.system_info.os, report.system_info.os);
    }

    #[test]
    fn test_parse_proc_field() {
        let content = "processor\t: 0\nmodel name\t: Example CPU @ 3.00GHz\nMemTotal:  1024 kB\n";
        assert_eq!(
            parse_proc_field(content, "model name").as_deref(),
            Some("Example CPU @ 3.00GHz")
        );
        assert_eq!(parse_proc_field(content, "MemTotal").as_deref(), Some("1024 kB"));
        assert_eq!(parse_proc_field(content, "flags"), None);
    }

    #[test]
    fn test_system_info_detection() {
        let system_info = SystemInfo::detect();
        assert!(!system_info.os.is_empty());
        assert!(!system_info.cpu.is_empty());
        assert!(system_info.cpu_count >= 1);
    }
}
