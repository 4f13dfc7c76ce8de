use jobwarden::fs::{FileJobStore, JobLog};
use jobwarden::models::{JobStatus, LogMessage, Severity};
use jobwarden::store::{JobRecordStore, LogPublisher};
use std::path::Path;
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

use super::{spawn_sleep, state_dir};

fn jobwarden(state_root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jobwarden"));
    cmd.arg("--state-dir").arg(state_root).env_remove("RUST_LOG");
    cmd
}

fn run(state_root: &Path, args: &[&str]) -> Output {
    jobwarden(state_root)
        .args(args)
        .output()
        .expect("Failed to run jobwarden")
}

#[test]
fn test_job_lifecycle_commands() {
    let (_tmp, state) = state_dir();
    let root = state.root();

    assert!(run(root, &["job", "create", "--job-id", "5", "--pid", "4242"])
        .status
        .success());
    // Creating the same job twice is refused.
    assert!(!run(root, &["job", "create", "--job-id", "5", "--pid", "4242"])
        .status
        .success());

    assert!(run(root, &["job", "set-status", "5", "running"]).status.success());
    assert!(run(root, &["job", "set-status", "5", "succeeded"]).status.success());
    // Terminal states are final.
    let output = run(root, &["job", "set-status", "5", "running"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid status transition"));

    let output = run(root, &["job", "list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("4242"));

    let job = FileJobStore::new(state.clone()).get(5).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
}

#[test]
fn test_show_missing_job_fails() {
    let (_tmp, state) = state_dir();
    let output = run(state.root(), &["job", "show", "77"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("job 77 not found"));
}

#[test]
fn test_supervise_binary_fails_job_on_reported_error() {
    let (_tmp, state) = state_dir();
    let root = state.root();
    let mut worker = spawn_sleep("30");
    let pid = worker.id().to_string();

    assert!(run(root, &["job", "create", "--job-id", "9", "--pid", &pid])
        .status
        .success());
    assert!(run(root, &["job", "set-status", "9", "running"]).status.success());

    let mut supervisor = jobwarden(root)
        .args(["supervise", "--pid", &pid, "--job-id", "9", "--timeout", "0.05"])
        .spawn()
        .expect("Failed to spawn supervisor");

    // The tailer only sees lines written after it subscribes, so keep
    // reporting until the supervisor reacts.
    let log = JobLog::new(state.clone());
    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = supervisor.try_wait().unwrap() {
            break status;
        }
        assert!(Instant::now() < deadline, "supervisor did not finish");
        log.publish(9, &LogMessage::new("job.9", Severity::Error, "bad input"))
            .unwrap();
        thread::sleep(Duration::from_millis(200));
    };

    assert!(status.success());
    assert!(!worker.wait().unwrap().success());

    let job = FileJobStore::new(state.clone()).get(9).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.last_error().unwrap().detail, "bad input");
    assert_eq!(job.supervisor_pid, Some(supervisor.id()));
    assert!(job.stop_time.is_some());
}

#[test]
fn test_create_drops_stale_stats() {
    let (_tmp, state) = state_dir();
    let root = state.root();

    assert!(run(root, &["report", "failed-nodes", "--job-id", "6", "--count", "9"])
        .status
        .success());
    assert!(state.stats_path(6).exists());

    assert!(run(root, &["job", "create", "--job-id", "6", "--pid", "4242"])
        .status
        .success());
    assert!(!state.stats_path(6).exists());
}

#[test]
fn test_report_commands_update_stats() {
    let (_tmp, state) = state_dir();
    let root = state.root();

    assert!(run(root, &["report", "failure", "--job-id", "4", "--area", "h", "--name", "a"])
        .status
        .success());
    assert!(run(root, &["report", "failed-nodes", "--job-id", "4", "--count", "3"])
        .status
        .success());
    assert!(run(root, &["report", "cache", "--job-id", "4", "--key", "k", "--value", "v"])
        .status
        .success());
    assert!(!run(
        root,
        &["report", "log", "--job-id", "4", "--logger", "job.5", "--message", "x"]
    )
    .status
    .success());

    let stats = std::fs::read_to_string(state.stats_path(4)).unwrap();
    assert!(stats.contains("h/a:failed"));
    assert!(stats.contains("failed_nodes: 3"));
    assert!(state.job_cache_dir(4).join("k").exists());
}
