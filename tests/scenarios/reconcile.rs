use anyhow::Result;
use jobwarden::models::{JobId, JobStatus};
use jobwarden::process::SystemProcesses;
use jobwarden::reconcile::{ReconciliationScanner, SessionLauncher};
use jobwarden::store::JobRecordStore;
use std::cell::RefCell;

use super::{create_job, state_dir};

/// Pid that cannot belong to a live process (above any pid_max).
const DEAD_PID: u32 = 999_999_999;

/// Pretends every session runs as this test process, so it stays "alive".
#[derive(Default)]
struct RecordingLauncher {
    launches: RefCell<Vec<(JobId, u32)>>,
}

impl SessionLauncher for RecordingLauncher {
    fn launch(&self, job_id: JobId, job_pid: u32) -> Result<u32> {
        self.launches.borrow_mut().push((job_id, job_pid));
        Ok(std::process::id())
    }
}

#[test]
fn test_orphaned_job_gets_one_new_supervisor() {
    let (_tmp, state) = state_dir();
    let jobs = create_job(&state, 1, 4321, JobStatus::Running);
    jobs.set_supervisor_pid(1, DEAD_PID).unwrap();
    create_job(&state, 2, 4322, JobStatus::Succeeded);
    create_job(&state, 3, 4323, JobStatus::Pending);

    let processes = SystemProcesses;
    let launcher = RecordingLauncher::default();
    let scanner = ReconciliationScanner::new(&jobs, &processes, &launcher);

    let report = scanner.scan().unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(*launcher.launches.borrow(), vec![(1, 4321)]);
    assert_eq!(
        jobs.get(1).unwrap().supervisor_pid,
        Some(std::process::id())
    );

    // The recorded supervisor is alive now, so nothing is launched again.
    let report = scanner.scan().unwrap();
    assert!(report.launched.is_empty());
    assert_eq!(launcher.launches.borrow().len(), 1);
}

#[test]
fn test_running_job_without_supervisor_is_adopted() {
    let (_tmp, state) = state_dir();
    let jobs = create_job(&state, 8, 4400, JobStatus::Running);

    let processes = SystemProcesses;
    let launcher = RecordingLauncher::default();
    let report = ReconciliationScanner::new(&jobs, &processes, &launcher)
        .scan()
        .unwrap();

    assert_eq!(report.launched, vec![(8, std::process::id())]);
}

#[test]
fn test_corrupt_record_is_reported_not_fatal() {
    let (_tmp, state) = state_dir();
    let jobs = create_job(&state, 1, 4321, JobStatus::Running);
    std::fs::write(state.job_path(2), "{not yaml").unwrap();

    let processes = SystemProcesses;
    let launcher = RecordingLauncher::default();
    let report = ReconciliationScanner::new(&jobs, &processes, &launcher)
        .scan()
        .unwrap();

    assert_eq!(report.launched.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, 2);
}
