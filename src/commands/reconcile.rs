//! `jobwarden reconcile`: restart supervision for orphaned jobs.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::fs::{FileJobStore, StateDir};
use crate::process::SystemProcesses;
use crate::reconcile::{ProcessLauncher, ReconciliationScanner, ScanReport};

pub fn execute(state: &StateDir, config: &Config, watch: bool, interval: Option<u64>) -> Result<()> {
    state.initialize()?;

    let jobs = FileJobStore::new(state.clone());
    let processes = SystemProcesses;
    let launcher = ProcessLauncher::current_exe(state.clone())?;
    let scanner = ReconciliationScanner::new(&jobs, &processes, &launcher);

    if !watch {
        let report = scanner.scan()?;
        print_report(&report);
        return Ok(());
    }

    let interval_secs = interval.unwrap_or(config.reconcile.interval_secs);
    if interval_secs == 0 {
        bail!("--interval must be at least 1 second");
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("Failed to set Ctrl+C handler")?;

    println!(
        "{} Scanning for orphaned jobs every {}s (Ctrl+C to stop)",
        "→".cyan().bold(),
        interval_secs
    );
    scanner.watch(Duration::from_secs(interval_secs), &running, print_report);

    println!(
        "{} Reconciler stopped ({} supervisor(s) still running)",
        "✓".green().bold(),
        launcher.running()
    );
    Ok(())
}

fn print_report(report: &ScanReport) {
    for (job_id, pid) in &report.launched {
        println!(
            "{} Launched supervisor for job {} (pid {})",
            "✓".green(),
            job_id.to_string().cyan(),
            pid
        );
    }
    for (job_id, error) in &report.errors {
        eprintln!("{} Job {}: {}", "✗".red(), job_id, error);
    }
    println!(
        "{} Scanned {} job(s), launched {}, {} error(s)",
        "─".dimmed(),
        report.scanned,
        report.launched.len(),
        report.errors.len()
    );
}
