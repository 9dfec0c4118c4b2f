//! Shared helpers: stub benchmark binaries written as shell scripts

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script into `dir`
pub fn stub_binary(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("cache-effect-benchmarks");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stub that prints `ran: <arg>` and some stderr noise
pub fn echo_stub(dir: &Path) -> PathBuf {
    stub_binary(dir, "echo \"ran: $1\"\necho \"stderr for $1\" >&2")
}

/// Stub that logs start/end of every invocation to `log`, sleeping in between
pub fn logging_stub(dir: &Path, log: &Path) -> PathBuf {
    stub_binary(
        dir,
        &format!(
            "echo \"start $1\" >> '{log}'\nsleep 0.1\necho \"end $1\" >> '{log}'\necho \"ran: $1\"",
            log = log.display()
        ),
    )
}

/// Write a manifest with one name per line
pub fn write_manifest(dir: &Path, names: &[&str]) -> PathBuf {
    let path = dir.join("benchmark_list.txt");
    let mut content = names.join("\n");
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

/// File names in `dir`, sorted
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
