//! Run history persistence module
//!
//! Handles saving, loading, and rotation of run reports.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RunnerConfig;
use crate::models::RunReport;
use crate::{Result, RunnerError, MAX_HISTORY};

/// Run history storage manager
#[derive(Debug)]
pub struct RunHistory {
    history_path: PathBuf,
}

/// History file structure for JSON persistence
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    reports: Vec<RunReport>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            version: 1,
            reports: Vec::new(),
        }
    }
}

impl RunHistory {
    /// History stored at the location the configuration selects
    pub fn for_config(config: &RunnerConfig) -> Result<Self> {
        Ok(Self::at(config.history_file_path()?))
    }

    /// History stored in an explicit file
    pub fn at(history_path: impl Into<PathBuf>) -> Self {
        Self {
            history_path: history_path.into(),
        }
    }

    /// Load all reports from the history file, oldest first
    pub fn load(&self) -> Result<Vec<RunReport>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.history_path).map_err(|e| {
            RunnerError::History(format!(
                "Failed to read history file {}: {}",
                self.history_path.display(),
                e
            ))
        })?;

        let history_file: HistoryFile = serde_json::from_str(&content).map_err(|e| {
            RunnerError::History(format!(
                "Failed to parse history file {}: {}",
                self.history_path.display(),
                e
            ))
        })?;

        Ok(history_file.reports)
    }

    /// Append a new report to the history file
    /// Automatically rotates old reports beyond MAX_HISTORY entries
    pub fn append(&self, report: RunReport) -> Result<()> {
        let mut reports = self.load()?;

        reports.push(report);

        if reports.len() > MAX_HISTORY {
            let skip_count = reports.len() - MAX_HISTORY;
            reports.drain(..skip_count);
        }

        self.save(reports)
    }

    fn save(&self, reports: Vec<RunReport>) -> Result<()> {
        if let Some(parent) = self.history_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RunnerError::History(format!(
                    "Failed to create history directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let history_file = HistoryFile {
            version: 1,
            reports,
        };

        let content = serde_json::to_string_pretty(&history_file)?;

        fs::write(&self.history_path, content).map_err(|e| {
            RunnerError::History(format!(
                "Failed to write history file {}: {}",
                self.history_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the number of stored reports
    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Remove the history file
    pub fn clear(&self) -> Result<()> {
        if self.history_path.exists() {
            fs::remove_file(&self.history_path).map_err(|e| {
                RunnerError::History(format!(
                    "Failed to remove history file {}: {}",
                    self.history_path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Get the most recent N reports, oldest first
    pub fn recent(&self, count: usize) -> Result<Vec<RunReport>> {
        let mut reports = self.load()?;
        if reports.len() > count {
            reports.drain(..reports.len() - count);
        }
        Ok(reports)
    }

    pub fn path(&self) -> &Path {
        &self.history_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_report(planned: usize) -> RunReport {
        RunReport::new(RunnerConfig::default(), planned)
    }

    #[test]
    fn test_load_empty_history() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::at(temp_dir.path().join("history.json"));
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::at(temp_dir.path().join("nested").join("history.json"));

        history.append(create_test_report(7)).unwrap();

        let reports = history.load().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].planned, 7);
    }

    #[test]
    fn test_history_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::at(temp_dir.path().join("history.json"));

        for i in 0..MAX_HISTORY + 10 {
            history.append(create_test_report(i)).unwrap();
        }

        let reports = history.load().unwrap();
        assert_eq!(reports.len(), MAX_HISTORY);
        assert_eq!(reports[0].planned, 10);
        assert_eq!(reports[reports.len() - 1].planned, MAX_HISTORY + 10 - 1);
    }

    #[test]
    fn test_count_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::at(temp_dir.path().join("history.json"));

        assert_eq!(history.count().unwrap(), 0);
        for _ in 0..3 {
            history.append(create_test_report(1)).unwrap();
        }
        assert_eq!(history.count().unwrap(), 3);

        history.clear().unwrap();
        assert_eq!(history.count().unwrap(), 0);
        assert!(!history.path().exists());
    }

    #[test]
    fn test_recent() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::at(temp_dir.path().join("history.json"));

        for i in 0..10 {
            history.append(create_test_report(i)).unwrap();
        }

        let recent = history.recent(5).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].planned, 5);
        assert_eq!(recent[4].planned, 9);

        assert_eq!(history.recent(20).unwrap().len(), 10);
    }

    #[test]
    fn test_corrupt_history_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        let history = RunHistory::at(&path);
        assert!(matches!(history.load(), Err(RunnerError::History(_))));
    }

    #[test]
    fn test_history_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        let history = RunHistory::at(&path);

        history.append(create_test_report(2)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let history_file: HistoryFile = serde_json::from_str(&content).unwrap();
        assert_eq!(history_file.version, 1);
        assert_eq!(history_file.reports.len(), 1);
    }
}
