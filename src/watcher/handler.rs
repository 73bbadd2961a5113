use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::ChangeEvent;
use crate::HandlerError;

/// Caller-supplied processing of one change event.
///
/// Invoked once per delivered event, in stream order. A failure puts the
/// event into the retry policy; it never ends the watch loop. Handlers
/// should be idempotent, since redelivery happens after a takeover whose
/// checkpoint write did not land.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        event: &ChangeEvent,
    ) -> std::result::Result<(), HandlerError>;
}
