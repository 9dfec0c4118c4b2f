//! Benchmark manifest
//!
//! The manifest is a plain text file with one benchmark name per line. It is
//! read once before the run starts and never modified afterwards.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, RunnerError};

/// A benchmark identifier: the binary's sole argument and the result file stem
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BenchmarkName(String);

impl BenchmarkName {
    /// Validate a trimmed, non-empty manifest entry.
    ///
    /// Names must stay inside the results directory once `.txt` is appended,
    /// so path separators and NUL are refused. `.` and `..` become the plain
    /// files `..txt` and `...txt` and are accepted.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        if raw.is_empty() {
            return Err("name is empty".to_string());
        }
        if let Some(c) = raw.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(format!("'{}' contains {:?}", raw, c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BenchmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BenchmarkName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered list of benchmarks to run
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    source: Option<PathBuf>,
    names: Vec<BenchmarkName>,
}

impl Manifest {
    /// Read and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| RunnerError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;

        let names = Self::parse(&content)?;
        tracing::debug!(
            manifest = %path.display(),
            count = names.len(),
            "loaded benchmark manifest"
        );

        Ok(Self {
            source: Some(path.to_path_buf()),
            names,
        })
    }

    /// Parse manifest text. Every line is trimmed; lines left empty are skipped.
    pub fn parse(content: &str) -> Result<Vec<BenchmarkName>> {
        let mut names = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                tracing::warn!(line = idx + 1, "skipping blank manifest line");
                continue;
            }
            let name = BenchmarkName::parse(trimmed).map_err(|reason| RunnerError::InvalidName {
                line: idx + 1,
                reason,
            })?;
            names.push(name);
        }
        Ok(names)
    }

    /// Build a manifest from names already in memory
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                BenchmarkName::parse(raw.as_ref().trim())
                    .map_err(|reason| RunnerError::InvalidName { line: idx + 1, reason })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: None,
            names,
        })
    }

    /// File the manifest was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn names(&self) -> &[BenchmarkName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkName> {
        self.names.iter()
    }

    /// Names listed more than once, in order of first appearance.
    /// Later runs of such a name overwrite the earlier result file.
    pub fn duplicates(&self) -> Vec<&BenchmarkName> {
        let mut counts: HashMap<&BenchmarkName, usize> = HashMap::new();
        for name in &self.names {
            *counts.entry(name).or_default() += 1;
        }

        let mut seen = Vec::new();
        for name in &self.names {
            if counts[name] > 1 && !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a BenchmarkName;
    type IntoIter = std::slice::Iter<'a, BenchmarkName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
