//! Advisory-locked file access for state shared between supervisors,
//! workers and the reconciler.
//!
//! Locks are cooperative: every process touching the state directory goes
//! through these functions.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Read file contents under a shared lock.
pub fn locked_read(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to acquire shared lock: {}", path.display()))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(content)
}

/// Replace file contents under an exclusive lock.
///
/// The file is truncated only after the lock is held, so a concurrent reader
/// never observes an empty file.
pub fn locked_write(path: &Path, content: &str) -> Result<()> {
    #[allow(clippy::suspicious_open_options)]
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open file for writing: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    replace_contents(&mut file, path, content)
}

/// Read-modify-write under a single exclusive lock.
///
/// `update` receives the current contents and returns the new contents.
/// The file must already exist.
pub fn locked_update<F>(path: &Path, update: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<String>,
{
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open file for update: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;

    let mut current = String::new();
    file.read_to_string(&mut current)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let updated = update(&current)?;
    replace_contents(&mut file, path, &updated)
}

/// Append one line under an exclusive lock, creating the file if needed.
pub fn locked_append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open file for append: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    writeln!(file, "{line}")
        .and_then(|()| file.flush())
        .with_context(|| format!("Failed to append to file: {}", path.display()))
}

fn replace_contents(file: &mut File, path: &Path, content: &str) -> Result<()> {
    file.set_len(0)
        .with_context(|| format!("Failed to truncate file: {}", path.display()))?;
    file.seek(SeekFrom::Start(0))
        .with_context(|| format!("Failed to rewind file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.flush())
        .with_context(|| format!("Failed to write file: {}", path.display()))
}
