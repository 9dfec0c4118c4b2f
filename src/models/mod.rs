//! Data models module
//!
//! Contains per-benchmark outcomes, run reports and system information.

pub mod result;

// Re-export commonly used types
pub use result::{BenchmarkOutcome, ExitOutcome, RunReport, SystemInfo};
