//! Cache inspection and cleanup behind the `cache-gc` binary.

use anyhow::{bail, Result};

use crate::fs::{FileCache, StateDir};
use crate::models::JobId;
use crate::store::CacheReclaimer;

/// Print the ids of every job holding cache entries.
pub fn list(state: &StateDir) -> Result<()> {
    let jobs = FileCache::new(state.clone()).cached_jobs()?;

    if jobs.is_empty() {
        println!("There are currently no jobs cached.");
    } else {
        println!("Currently cached jobs:");
        for job_id in jobs {
            println!("{job_id}");
        }
    }
    Ok(())
}

/// Remove every cache entry of the job named by `job`.
///
/// `job` is taken verbatim from the command line so a non-numeric value can
/// be answered with usage hints instead of a parse error.
pub fn clear(state: &StateDir, job: &str) -> Result<()> {
    let Ok(job_id) = job.trim().parse::<JobId>() else {
        println!("Job ID should be an integer.");
        println!("Use the --list option to show current jobs.");
        bail!("Invalid job id '{job}'");
    };

    println!("Attempting to clear cache data for job {job_id}...");
    match FileCache::new(state.clone()).reclaim(job_id)? {
        Some(removed) => println!("Removed {removed} keys."),
        None => println!("Job {job_id} not found."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_rejects_non_integer() {
        let tmp = TempDir::new().unwrap();
        let state = StateDir::new(tmp.path());
        let err = clear(&state, "abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_clear_removes_entries() {
        let tmp = TempDir::new().unwrap();
        let state = StateDir::new(tmp.path());
        state.initialize().unwrap();
        let cache = FileCache::new(state.clone());
        cache.put(3, "hazard", "1").unwrap();

        clear(&state, "3").unwrap();
        assert!(cache.cached_jobs().unwrap().is_empty());
        // Clearing again finds nothing but still succeeds.
        clear(&state, "3").unwrap();
    }
}
