use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::EventId;
use crate::Result;

/// Durable resume position of a watcher.
///
/// The token is the position id of the last fully handled event and is
/// handed back verbatim when the next stream session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint(Vec<u8>);

impl Checkpoint {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Checkpoint(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&EventId> for Checkpoint {
    fn from(id: &EventId) -> Self {
        Checkpoint(id.as_bytes().to_vec())
    }
}

impl From<EventId> for Checkpoint {
    fn from(id: EventId) -> Self {
        Checkpoint(id.into_bytes())
    }
}

impl AsRef<[u8]> for Checkpoint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Durable store for checkpoints and retry counters.
///
/// One store is shared by every watcher a factory creates. Checkpoints are
/// keyed by watcher id, retry counters by event id.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CheckpointStore: Send + Sync + 'static {
    /// Reads the last recorded resume position for a watcher.
    async fn get_checkpoint(
        &self,
        watcher_id: &str,
    ) -> Result<Option<Checkpoint>>;

    /// Overwrites the resume position for a watcher.
    async fn put_checkpoint(
        &self,
        watcher_id: &str,
        checkpoint: &Checkpoint,
    ) -> Result<()>;

    /// Atomically bumps the failure count of one event and returns the
    /// new value.
    ///
    /// Counters are never purged by the watcher. The store owner may clear
    /// the retry namespace out of band once events age out.
    async fn increment_retry(
        &self,
        event_id: &EventId,
    ) -> Result<u64>;
}
