//! Shared helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use clap::Parser;
use simdupe::cli::Cli;
use simdupe::error::ExitCode;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Serialize tests that read `SIMDUPE_*` variables and clear them.
pub fn lock_env() -> MutexGuard<'static, ()> {
    let guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    for (key, _) in std::env::vars() {
        if key.starts_with("SIMDUPE_") {
            std::env::remove_var(key);
        }
    }
    guard
}

/// Write a manifest with a `path,kind,fingerprint,error` header.
pub fn write_manifest(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from("path,kind,fingerprint,error\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

/// Write an empty config file so runs do not pick up the user's own.
pub fn empty_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, "").unwrap();
    path
}

/// Parse `args` as a command line and run it.
pub fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["simdupe", "-q"];
    argv.extend_from_slice(args);
    simdupe::run_app(Cli::try_parse_from(argv)?)
}

/// Read a JSON report.
pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Convert a path to `&str` for argument lists.
pub fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}
