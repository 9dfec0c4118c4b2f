//! Benchmark execution module
//!
//! Contains the sequential run loop and the single-invocation process
//! handling it is built on.

pub mod process;
pub mod sequential;

// Re-export commonly used types
pub use sequential::{ProgressUpdate, SequentialRunner};
