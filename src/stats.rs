//! Usage counters.
//!
//! Recording a statistic is best-effort: callers log a failed increment and
//! carry on.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("statistics sink is closed")]
    Closed,
    #[error("statistics backend failed: {0}")]
    Backend(String),
}

/// Something that counts named events.
pub trait StatsCollector: Send + Sync {
    fn increment(&self, counter: &str) -> Result<(), StatsError>;
}

impl<T: StatsCollector + ?Sized> StatsCollector for Arc<T> {
    fn increment(&self, counter: &str) -> Result<(), StatsError> {
        (**self).increment(counter)
    }
}

/// Counters kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStats {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: &str) -> u64 {
        self.counters.lock().get(counter).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.lock().clone()
    }
}

impl StatsCollector for InMemoryStats {
    fn increment(&self, counter: &str) -> Result<(), StatsError> {
        *self.counters.lock().entry(counter.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

/// Hands increments to a background task so the caller never waits on the
/// backing store.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelStats {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Spawns a task that forwards every increment to `sink`. The task ends
    /// once every `ChannelStats` handle is dropped.
    pub fn forward_to(sink: Arc<dyn StatsCollector>) -> (Self, JoinHandle<()>) {
        let (stats, mut rx) = Self::channel();
        let handle = tokio::spawn(async move {
            while let Some(counter) = rx.recv().await {
                if let Err(e) = sink.increment(&counter) {
                    warn!(%counter, error = %e, "dropping statistic");
                }
            }
        });
        (stats, handle)
    }
}

impl StatsCollector for ChannelStats {
    fn increment(&self, counter: &str) -> Result<(), StatsError> {
        self.tx
            .send(counter.to_string())
            .map_err(|_| StatsError::Closed)
    }
}
