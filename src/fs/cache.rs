//! Job-scoped key/value cache under `<state>/cache/<job-id>/`.
//!
//! Each key is one file in the job's directory. Workers fill it; supervisors
//! reclaim it when the job ends; `cache-gc` inspects and clears it by hand.

use anyhow::{bail, Context, Result};
use std::fs;

use crate::models::JobId;
use crate::store::CacheReclaimer;

use super::locking::{locked_read, locked_write};
use super::state_dir::StateDir;

#[derive(Debug, Clone)]
pub struct FileCache {
    state: StateDir,
}

impl FileCache {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    pub fn put(&self, job_id: JobId, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let dir = self.state.job_cache_dir(job_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        locked_write(&dir.join(key), value)
    }

    pub fn get(&self, job_id: JobId, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.state.job_cache_dir(job_id).join(key);
        if !path.exists() {
            return Ok(None);
        }
        locked_read(&path).map(Some)
    }

    /// Ids of jobs that currently hold cache entries, ascending.
    ///
    /// Directories whose name is not a job id are ignored.
    pub fn cached_jobs(&self) -> Result<Vec<JobId>> {
        let cache_dir = self.state.cache_dir();
        if !cache_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&cache_dir).with_context(|| {
            format!("Failed to read cache directory: {}", cache_dir.display())
        })?;

        let mut ids: Vec<JobId> = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        Ok(ids)
    }
}

impl CacheReclaimer for FileCache {
    fn reclaim(&self, job_id: JobId) -> Result<Option<usize>> {
        tracing::info!(job_id, "Cleaning up cache after job");

        let dir = self.state.job_cache_dir(job_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read cache directory: {}", dir.display()))
            }
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                // Another reclaimer got there first.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove cache entry: {}", path.display())
                    })
                }
            }
        }

        match fs::remove_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove cache directory: {}", dir.display()))
            }
        }

        Ok(Some(removed))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains('/') || key == "." || key == ".." {
        bail!("Invalid cache key '{key}'");
    }
    Ok(())
}
