//! Single benchmark invocation
//!
//! Opens the result file, launches the external binary with the benchmark
//! name as its only argument, and waits for it to exit.

use std::fs::{self, File};
use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::process::{Child, Command};

use crate::config::{RunnerConfig, StderrMode};
use crate::manifest::BenchmarkName;
use crate::models::{BenchmarkOutcome, ExitOutcome};
use crate::{Result, RunnerError};

/// Run one benchmark to completion.
///
/// Only result-file creation failures are returned as errors. Every way the
/// child itself can go wrong is folded into the outcome.
pub async fn invoke(
    config: &RunnerConfig,
    index: usize,
    name: &BenchmarkName,
) -> Result<BenchmarkOutcome> {
    let result_path = config.result_path(name.as_str());
    let result_file = File::create(&result_path).map_err(|source| RunnerError::ResultFile {
        path: result_path.clone(),
        source,
    })?;
    let stderr = stderr_stdio(config, name)?;

    let started_at = Utc::now();
    let start = Instant::now();

    // The command owns the parent's copies of the result handles; dropping it
    // right after spawn leaves the child as the only writer.
    let spawned = {
        let mut command = Command::new(&config.binary_path);
        command
            .arg(name.as_str())
            .stdout(Stdio::from(result_file))
            .stderr(stderr)
            .kill_on_drop(true);
        command.spawn()
    };

    let exit = match spawned {
        Ok(mut child) => {
            tracing::debug!(
                benchmark = %name,
                pid = child.id(),
                binary = %config.binary_path.display(),
                "spawned benchmark"
            );
            wait_for_exit(&mut child, config.timeout).await?
        }
        Err(e) => {
            tracing::warn!(
                benchmark = %name,
                binary = %config.binary_path.display(),
                "failed to start benchmark binary: {}",
                e
            );
            ExitOutcome::SpawnFailed {
                reason: e.to_string(),
            }
        }
    };

    let elapsed = start.elapsed();
    let bytes_captured = fs::metadata(&result_path).map(|m| m.len()).unwrap_or(0);

    Ok(BenchmarkOutcome {
        name: name.to_string(),
        index,
        result_path,
        exit,
        started_at,
        elapsed,
        bytes_captured,
    })
}

/// Block until the child exits, killing it once `timeout` elapses
async fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<ExitOutcome> {
    let Some(limit) = timeout else {
        let status = child.wait().await?;
        return Ok(ExitOutcome::from_status(status));
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => Ok(ExitOutcome::from_status(status?)),
        Err(_) => {
            // kill() also reaps the process
            child.kill().await?;
            Ok(ExitOutcome::TimedOut { after: limit })
        }
    }
}

fn stderr_stdio(config: &RunnerConfig, name: &BenchmarkName) -> Result<Stdio> {
    match config.stderr_mode {
        StderrMode::Inherit => Ok(Stdio::inherit()),
        StderrMode::Null => Ok(Stdio::null()),
        StderrMode::File => {
            let dir = config.stderr_dir();
            fs::create_dir_all(&dir).map_err(|source| RunnerError::ResultFile {
                path: dir.clone(),
                source,
            })?;
            let path = config.stderr_path(name.as_str());
            let file = File::create(&path)
                .map_err(|source| RunnerError::ResultFile { path, source })?;
            Ok(Stdio::from(file))
        }
    }
}
