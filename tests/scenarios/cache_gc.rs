use jobwarden::fs::FileCache;
use std::path::Path;
use std::process::{Command, Output};

use super::state_dir;

fn cache_gc(state_root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cache-gc"))
        .arg("--state-dir")
        .arg(state_root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run cache-gc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_list_without_cached_jobs() {
    let (_tmp, state) = state_dir();
    let output = cache_gc(state.root(), &["--list"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "There are currently no jobs cached.");
}

#[test]
fn test_list_and_clear() {
    let (_tmp, state) = state_dir();
    let cache = FileCache::new(state.clone());
    cache.put(12, "hazard", "1").unwrap();
    cache.put(3, "hazard", "1").unwrap();
    cache.put(3, "gmf", "2").unwrap();

    let output = cache_gc(state.root(), &["-l"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Currently cached jobs:\n3\n12\n");

    let output = cache_gc(state.root(), &["-j", "3"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Attempting to clear cache data for job 3...\nRemoved 2 keys.\n"
    );

    let output = cache_gc(state.root(), &["--job", "3"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Job 3 not found."));

    assert_eq!(cache.cached_jobs().unwrap(), vec![12]);
}

#[test]
fn test_non_integer_job_id() {
    let (_tmp, state) = state_dir();
    let output = cache_gc(state.root(), &["-j", "abc"]);

    assert!(!output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Job ID should be an integer."));
    assert!(out.contains("Use the --list option to show current jobs."));
}

#[test]
fn test_no_options_prints_usage() {
    let (_tmp, state) = state_dir();
    let output = cache_gc(state.root(), &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage: cache-gc"));
}

#[test]
fn test_list_and_job_are_exclusive() {
    let (_tmp, state) = state_dir();
    let output = cache_gc(state.root(), &["-l", "-j", "3"]);
    assert!(!output.status.success());
}
