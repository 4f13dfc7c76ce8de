use jobwarden::events::LogTailer;
use jobwarden::fs::{FileCache, FileSignals, JobLog, StateDir};
use jobwarden::models::{JobStatus, LogMessage, Severity};
use jobwarden::process::SystemProcesses;
use jobwarden::store::{JobRecordStore, LogPublisher};
use jobwarden::supervisor::{
    Collaborators, SessionConfig, SupervisorSession, Termination, ThresholdBreach,
};
use std::fs;
use std::thread;
use std::time::Duration;

use super::{create_job, spawn_sleep, state_dir};

struct Stores {
    jobs: jobwarden::fs::FileJobStore,
    signals: FileSignals,
    cache: FileCache,
    log: JobLog,
}

impl Stores {
    fn new(state: &StateDir, jobs: jobwarden::fs::FileJobStore) -> Self {
        Self {
            jobs,
            signals: FileSignals::new(state.clone(), 3600),
            cache: FileCache::new(state.clone()),
            log: JobLog::new(state.clone()),
        }
    }

    fn collaborators<'a>(&'a self, processes: &'a SystemProcesses) -> Collaborators<'a> {
        Collaborators {
            processes,
            jobs: &self.jobs,
            signals: &self.signals,
            cache: &self.cache,
            publisher: Some(&self.log),
        }
    }

    fn tailer(&self, job_id: u64) -> LogTailer {
        self.log.tailer(job_id)
    }
}

fn fast(debounce_threshold: u32) -> SessionConfig {
    SessionConfig {
        receive_timeout: Duration::from_millis(50),
        debounce_threshold,
    }
}

#[test]
fn test_reported_error_kills_worker_and_fails_job() {
    let (_tmp, state) = state_dir();
    let mut worker = spawn_sleep("30");
    let pid = worker.id();
    let jobs = create_job(&state, 1, pid, JobStatus::Running);
    let stores = Stores::new(&state, jobs);
    stores.cache.put(1, "hazard", "0.1").unwrap();
    stores.cache.put(1, "gmf", "0.2").unwrap();

    let log = stores.log.clone();
    let reporter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        log.publish(
            1,
            &LogMessage::new("job.1.worker", Severity::Critical, "out of memory"),
        )
        .unwrap();
    });

    let processes = SystemProcesses;
    let mut tailer = stores.tailer(1);
    let termination = SupervisorSession::new(1, pid, fast(1000), stores.collaborators(&processes), &mut tailer)
        .run()
        .unwrap();
    reporter.join().unwrap();

    assert_eq!(
        termination,
        Termination::ReportedFailure {
            logger: "job.1.worker".to_string(),
            message: "out of memory".to_string(),
        }
    );
    assert!(!worker.wait().unwrap().success());

    let job = stores.jobs.get(1).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.last_error().unwrap().detail, "out of memory");
    assert!(job.stop_time.is_some());
    assert!(!state.job_cache_dir(1).exists());
}

#[test]
fn test_worker_exit_after_success_keeps_status() {
    let (_tmp, state) = state_dir();
    let mut worker = spawn_sleep("0.3");
    let pid = worker.id();
    let jobs = create_job(&state, 2, pid, JobStatus::Succeeded);
    let stores = Stores::new(&state, jobs);
    let reaper = thread::spawn(move || worker.wait());

    let processes = SystemProcesses;
    let mut tailer = stores.tailer(2);
    let termination = SupervisorSession::new(2, pid, fast(1000), stores.collaborators(&processes), &mut tailer)
        .run()
        .unwrap();
    reaper.join().unwrap().unwrap();

    assert_eq!(
        termination,
        Termination::ProcessStopped {
            status: JobStatus::Succeeded
        }
    );
    let job = stores.jobs.get(2).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert!(job.errors.is_empty());
    assert!(job.stop_time.is_some());

    let log = fs::read_to_string(state.job_log_path(2)).unwrap();
    assert!(log.contains("job.2.supervisor"));
    assert!(log.contains(&format!("job process {pid} succeeded")));
}

#[test]
fn test_silent_crash_fails_running_job() {
    let (_tmp, state) = state_dir();
    let mut worker = spawn_sleep("0.3");
    let pid = worker.id();
    let jobs = create_job(&state, 3, pid, JobStatus::Running);
    let stores = Stores::new(&state, jobs);
    let reaper = thread::spawn(move || worker.wait());

    let processes = SystemProcesses;
    let mut tailer = stores.tailer(3);
    SupervisorSession::new(3, pid, fast(1000), stores.collaborators(&processes), &mut tailer)
        .run()
        .unwrap();
    reaper.join().unwrap().unwrap();

    let job = stores.jobs.get(3).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.last_error().unwrap().detail,
        format!("job process {pid} crashed or terminated")
    );
}

#[test]
fn test_failure_counters_terminate_worker() {
    let (_tmp, state) = state_dir();
    let mut worker = spawn_sleep("30");
    let pid = worker.id();
    let jobs = create_job(&state, 123, pid, JobStatus::Running);
    let stores = Stores::new(&state, jobs);
    stores.signals.incr_counter(123, "h", "a:failed").unwrap();
    stores.signals.incr_counter(123, "r", "b:failed").unwrap();
    stores.signals.incr_counter(123, "r", "b:failed").unwrap();

    let processes = SystemProcesses;
    let mut tailer = stores.tailer(123);
    let termination = SupervisorSession::new(123, pid, fast(3), stores.collaborators(&processes), &mut tailer)
        .run()
        .unwrap();

    assert!(matches!(
        termination,
        Termination::ThresholdExceeded(ThresholdBreach::FailureCounters(_))
    ));
    assert!(!worker.wait().unwrap().success());

    let job = stores.jobs.get(123).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.last_error().unwrap().detail,
        "job terminated with failures: h/a:failed=1, r/b:failed=2"
    );
}
