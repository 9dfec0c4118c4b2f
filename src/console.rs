//! Terminal front end for a run
//!
//! Streams runner progress to the terminal: a start and finish notice per
//! benchmark on stdout and an optional progress bar on stderr.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Notify};

use crate::bench::{ProgressUpdate, SequentialRunner};
use crate::manifest::Manifest;
use crate::models::{BenchmarkOutcome, RunReport};
use crate::util::units::{format_bytes, format_duration};
use crate::Result;

/// Notice printed before a benchmark is launched
pub fn start_notice(name: &str) -> String {
    format!("Starting benchmark: {}", name)
}

/// Notice printed after a benchmark's process has exited
pub fn finish_notice(name: &str) -> String {
    format!("Finished benchmark: {}", name)
}

/// One line describing a finished benchmark
pub fn outcome_line(outcome: &BenchmarkOutcome) -> String {
    format!(
        "  {:<24} {:<28} {:>10} {:>10}",
        outcome.name,
        outcome.exit.description(),
        format_bytes(outcome.bytes_captured),
        format_duration(outcome.elapsed)
    )
}

/// Run the manifest while printing progress notices.
///
/// Each start notice is on stdout before its benchmark is spawned.
pub async fn run_with_progress(
    runner: &SequentialRunner,
    manifest: &Manifest,
    show_bar: bool,
) -> Result<RunReport> {
    let (tx, mut rx) = mpsc::channel(100);

    let pb = if show_bar {
        ProgressBar::new(manifest.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {elapsed_precise} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let ack = Arc::new(Notify::new());
    let runner = runner.clone().with_start_ack(Arc::clone(&ack));

    let handle = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            match &update {
                ProgressUpdate::Started { name, .. } => {
                    pb.set_message(name.clone());
                    pb.suspend(|| println!("{}", start_notice(name)));
                    ack.notify_one();
                }
                ProgressUpdate::Finished { outcome, .. } => {
                    pb.set_position(update.completed() as u64);
                    pb.suspend(|| println!("{}", finish_notice(&outcome.name)));
                }
            }
        }
        pb.finish_and_clear();
    });

    let result = runner.run_manifest(manifest, tx).await;
    handle.await.ok();
    result
}

/// Print the end-of-run summary, listing benchmarks that did not succeed
pub fn print_report(report: &RunReport) {
    println!();
    println!("{}", report.summary());

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("Benchmarks that did not succeed:");
        for outcome in failures {
            println!("{}", outcome_line(outcome));
        }
    }
    if report.stopped_early {
        println!(
            "Stopped early ({}); {} benchmark(s) not run.",
            report.config.failure_policy.description(),
            report.skipped()
        );
    }
}
