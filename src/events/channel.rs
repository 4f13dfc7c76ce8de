use anyhow::Result;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::models::LogMessage;

use super::{EventSource, Received, RoutingKey};

/// In-process [`EventSource`] fed through an `mpsc` channel.
///
/// Messages outside the subscribed namespace are dropped on receipt. Before
/// `subscribe` nothing is delivered.
pub struct ChannelSource {
    rx: Receiver<LogMessage>,
    key: Option<RoutingKey>,
}

impl ChannelSource {
    pub fn new() -> (Sender<LogMessage>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::from_receiver(rx))
    }

    pub fn from_receiver(rx: Receiver<LogMessage>) -> Self {
        Self { rx, key: None }
    }
}

impl EventSource for ChannelSource {
    fn subscribe(&mut self, key: &RoutingKey) -> Result<()> {
        self.key = Some(key.clone());
        Ok(())
    }

    fn receive_or_timeout(&mut self, timeout: Duration) -> Result<Received> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(message) => {
                    let wanted = self
                        .key
                        .as_ref()
                        .is_some_and(|key| key.matches(&message.logger));
                    if wanted {
                        return Ok(Received::Message(message));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(Received::Timeout),
                Err(RecvTimeoutError::Disconnected) => {
                    // No producers left; keep the tick cadence for polling.
                    thread::sleep(remaining);
                    return Ok(Received::Timeout);
                }
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.key = None;
    }
}
