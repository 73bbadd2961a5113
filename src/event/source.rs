use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::ChangeEvent;
use super::EventFilter;
use crate::checkpoint::Checkpoint;
use crate::StreamError;

/// Everything a source needs to open one stream session.
#[derive(Debug, Clone, Default)]
pub struct StreamRequest {
    /// Which events the session should carry
    pub filter: EventFilter,
    /// Resume position from the previous session, if one was recorded
    pub resume_after: Option<Checkpoint>,
    /// Ask the source to attach the full document to update events
    pub attach_full_document: bool,
}

/// Factory for change stream sessions.
///
/// A source is opened once per ownership epoch. Opening after `resume_after`
/// must deliver every event positioned after that checkpoint, in order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    async fn open(
        &self,
        request: &StreamRequest,
    ) -> std::result::Result<Box<dyn ChangeStream>, StreamError>;
}

/// One open change stream session.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChangeStream: Send {
    /// Waits for the next event in feed order.
    ///
    /// `Ok(None)` means the source completed the stream; the watcher treats
    /// it like a disconnect and starts a fresh session.
    async fn next(&mut self) -> std::result::Result<Option<ChangeEvent>, StreamError>;
}
