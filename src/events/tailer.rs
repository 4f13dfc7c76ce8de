//! File-following [`EventSource`] over a JSON-lines job log.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::models::LogMessage;

use super::{EventSource, Received, RoutingKey};

/// Sleep between reads once the tailer has caught up with the file.
const TAIL_POLL_INTERVAL_MS: u64 = 100;

/// Follows a job log file on a background thread and hands matching
/// messages to the caller through a channel.
///
/// Only content appended after `subscribe` is delivered. If the file does not
/// exist yet the tailer waits for it and then reads it from the start.
pub struct LogTailer {
    path: PathBuf,
    rx: Option<Receiver<LogMessage>>,
    shutdown_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogTailer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rx: None,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl EventSource for LogTailer {
    fn subscribe(&mut self, key: &RoutingKey) -> Result<()> {
        if self.handle.is_some() {
            bail!("Already subscribed to {}", self.path.display());
        }

        let (tx, rx) = mpsc::channel();
        let path = self.path.clone();
        let key = key.clone();
        // Position at the end now so nothing appended after subscribe is missed.
        let opened = match File::open(&path) {
            Ok(mut file) => {
                file.seek(SeekFrom::End(0))
                    .with_context(|| format!("Failed to seek job log: {}", path.display()))?;
                Some(file)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open job log: {}", path.display()))
            }
        };
        self.shutdown_flag.store(false, Ordering::Relaxed);
        let shutdown_flag = Arc::clone(&self.shutdown_flag);

        tracing::debug!(path = %path.display(), routing_key = %key, "Subscribing to job log");

        let handle = thread::Builder::new()
            .name("job-log-tailer".to_string())
            .spawn(move || {
                if let Err(e) = run_tailer(&path, &key, opened, &shutdown_flag, &tx) {
                    tracing::error!(path = %path.display(), error = %e, "Job log tailer failed");
                }
            })
            .context("Failed to spawn job log tailer thread")?;

        self.rx = Some(rx);
        self.handle = Some(handle);
        Ok(())
    }

    fn receive_or_timeout(&mut self, timeout: Duration) -> Result<Received> {
        let Some(rx) = self.rx.as_ref() else {
            bail!("Receive on {} before subscribing", self.path.display());
        };

        match rx.recv_timeout(timeout) {
            Ok(message) => Ok(Received::Message(message)),
            Err(RecvTimeoutError::Timeout) => Ok(Received::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                bail!("Job log tailer for {} stopped", self.path.display())
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        self.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(path = %self.path.display(), "Job log tailer panicked");
            }
        }
    }
}

impl Drop for LogTailer {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn run_tailer(
    path: &Path,
    key: &RoutingKey,
    opened: Option<File>,
    shutdown_flag: &AtomicBool,
    tx: &Sender<LogMessage>,
) -> Result<()> {
    let poll = Duration::from_millis(TAIL_POLL_INTERVAL_MS);

    let file = match opened {
        Some(file) => file,
        None => loop {
            if shutdown_flag.load(Ordering::Relaxed) {
                return Ok(());
            }
            match File::open(path) {
                Ok(file) => break file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => thread::sleep(poll),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to open job log: {}", path.display()))
                }
            }
        },
    };

    let mut reader = BufReader::new(file);

    // A writer may be caught mid-line; keep the partial line until its newline arrives.
    let mut pending: Vec<u8> = Vec::new();

    while !shutdown_flag.load(Ordering::Relaxed) {
        match reader.read_until(b'\n', &mut pending) {
            Ok(0) => thread::sleep(poll),
            Ok(_) if pending.last() != Some(&b'\n') => thread::sleep(poll),
            Ok(_) => {
                if !pending.trim_ascii().is_empty() {
                    match serde_json::from_slice::<LogMessage>(&pending) {
                        Ok(message) if key.matches(&message.logger) => {
                            if tx.send(message).is_err() {
                                return Ok(());
                            }
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Skipping malformed job log line"
                        ),
                    }
                }
                pending.clear();
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read job log: {}", path.display()))
            }
        }
    }

    Ok(())
}
