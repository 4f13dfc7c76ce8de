use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::JobId;

const SUBDIRS: [&str; 4] = ["jobs", "stats", "cache", "logs"];

/// Layout of the shared state directory.
///
/// ```text
/// <root>/
///   config.toml
///   jobs/<id>.yaml        job records
///   stats/<id>.yaml       failure counters and progress
///   cache/<id>/<key>      job-scoped cache entries
///   logs/job-<id>.jsonl   job log streams
///   logs/supervisor-<id>.log
/// ```
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the root and all subdirectories. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create state directory: {}", self.root.display())
        })?;

        for subdir in &SUBDIRS {
            let path = self.root.join(subdir);
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create {subdir} directory"))?;
        }

        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn job_path(&self, job_id: JobId) -> PathBuf {
        self.jobs_dir().join(format!("{job_id}.yaml"))
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.root.join("stats")
    }

    pub fn stats_path(&self, job_id: JobId) -> PathBuf {
        self.stats_dir().join(format!("{job_id}.yaml"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn job_cache_dir(&self, job_id: JobId) -> PathBuf {
        self.cache_dir().join(job_id.to_string())
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn job_log_path(&self, job_id: JobId) -> PathBuf {
        self.logs_dir().join(format!("job-{job_id}.jsonl"))
    }

    /// Diagnostic log of a supervisor launched in the background.
    pub fn supervisor_log_path(&self, job_id: JobId) -> PathBuf {
        self.logs_dir().join(format!("supervisor-{job_id}.log"))
    }
}

/// Parse the numeric job id out of a file stem like `42` or `42.yaml`.
pub(crate) fn job_id_from_path(path: &Path) -> Option<JobId> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok())
}
