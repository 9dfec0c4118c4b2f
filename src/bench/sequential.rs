//! Sequential benchmark runner
//!
//! Runs every manifest entry one after another, in manifest order. A
//! benchmark is only launched once the previous one has exited and its
//! result file has been closed, so measurements never share the machine.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Notify};

use crate::bench::process;
use crate::config::RunnerConfig;
use crate::manifest::Manifest;
use crate::models::{BenchmarkOutcome, RunReport};
use crate::{Result, RunnerError};

/// Progress update sent during a run
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// A benchmark is about to be launched
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    /// A benchmark's process has exited and its result file is closed
    Finished {
        index: usize,
        total: usize,
        outcome: BenchmarkOutcome,
    },
}

impl ProgressUpdate {
    /// Name of the benchmark the update refers to
    pub fn name(&self) -> &str {
        match self {
            ProgressUpdate::Started { name, .. } => name,
            ProgressUpdate::Finished { outcome, .. } => &outcome.name,
        }
    }

    /// Number of benchmarks finished once this update is applied
    pub fn completed(&self) -> usize {
        match self {
            ProgressUpdate::Started { index, .. } => *index,
            ProgressUpdate::Finished { index, .. } => index + 1,
        }
    }
}

/// Sequential benchmark executor
#[derive(Debug, Clone)]
pub struct SequentialRunner {
    config: RunnerConfig,
    start_ack: Option<Arc<Notify>>,
}

impl SequentialRunner {
    /// Create a new runner after validating its configuration
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            start_ack: None,
        })
    }

    /// Hold each launch until the receiver of a delivered `Started` update
    /// calls `notify_one` on `ack`
    pub fn with_start_ack(mut self, ack: Arc<Notify>) -> Self {
        self.start_ack = Some(ack);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Read the configured manifest
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.config.manifest_path)
    }

    /// Load the manifest and run every benchmark in it.
    ///
    /// Fails before touching the results directory when the manifest cannot
    /// be read.
    pub async fn run(&self, progress_tx: mpsc::Sender<ProgressUpdate>) -> Result<RunReport> {
        let manifest = self.load_manifest()?;
        self.run_manifest(&manifest, progress_tx).await
    }

    /// Run the benchmarks of an already loaded manifest
    pub async fn run_manifest(
        &self,
        manifest: &Manifest,
        progress_tx: mpsc::Sender<ProgressUpdate>,
    ) -> Result<RunReport> {
        self.prepare_results_dir()?;

        for name in manifest.duplicates() {
            tracing::warn!(
                benchmark = %name,
                "benchmark listed more than once; its result file will be overwritten"
            );
        }

        let total = manifest.len();
        let start_time = Instant::now();
        let mut report = RunReport::new(self.config.clone(), total);

        tracing::info!(
            total,
            binary = %self.config.binary_path.display(),
            results_dir = %self.config.results_dir.display(),
            policy = self.config.failure_policy.description(),
            "starting benchmark run"
        );

        for (index, name) in manifest.iter().enumerate() {
            tracing::info!(benchmark = %name, index, total, "starting benchmark");
            let delivered = send_progress(
                &progress_tx,
                ProgressUpdate::Started {
                    index,
                    total,
                    name: name.to_string(),
                },
            )
            .await;
            if let (true, Some(ack)) = (delivered, &self.start_ack) {
                ack.notified().await;
            }

            // The child has exited and every handle to its result file is
            // closed once this returns.
            let outcome = process::invoke(&self.config, index, name).await?;
            let succeeded = outcome.exit.is_success();

            if succeeded {
                tracing::info!(
                    benchmark = %name,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    bytes = outcome.bytes_captured,
                    "finished benchmark"
                );
            } else {
                tracing::warn!(
                    benchmark = %name,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "benchmark did not succeed: {}",
                    outcome.exit.description()
                );
            }

            report.outcomes.push(outcome.clone());
            send_progress(
                &progress_tx,
                ProgressUpdate::Finished {
                    index,
                    total,
                    outcome,
                },
            )
            .await;

            if !succeeded && !self.config.failure_policy.continues_after_failure() {
                report.stopped_early = index + 1 < total;
                if report.stopped_early {
                    tracing::warn!(
                        remaining = total - index - 1,
                        "stopping run after failed benchmark"
                    );
                }
                break;
            }
        }

        report.elapsed = start_time.elapsed();
        Ok(report)
    }

    fn prepare_results_dir(&self) -> Result<()> {
        let dir = &self.config.results_dir;
        if self.config.create_results_dir && !dir.is_dir() {
            fs::create_dir_all(dir).map_err(|source| RunnerError::ResultFile {
                path: dir.clone(),
                source,
            })?;
            tracing::debug!(results_dir = %dir.display(), "created results directory");
        }
        Ok(())
    }
}

/// Returns whether the update reached a live receiver
async fn send_progress(progress_tx: &mpsc::Sender<ProgressUpdate>, update: ProgressUpdate) -> bool {
    // Progress is advisory: a dropped receiver does not stop the run
    if progress_tx.send(update).await.is_err() {
        tracing::trace!("progress receiver dropped");
        return false;
    }
    true
}
