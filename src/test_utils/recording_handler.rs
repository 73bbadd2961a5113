use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::event::ChangeEvent;
use crate::event::EventId;
use crate::watcher::ChangeHandler;
use crate::HandlerError;

#[derive(Default)]
struct HandlerInner {
    handled: Mutex<Vec<ChangeEvent>>,
    attempts: Mutex<HashMap<Vec<u8>, usize>>,
    failures: Mutex<HashMap<Vec<u8>, usize>>,
}

/// Handler recording every invocation, with scripted failures per event.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    inner: Arc<HandlerInner>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `failures` attempts for this event will fail.
    pub fn fail_times(
        &self,
        event_id: &EventId,
        failures: usize,
    ) {
        self.inner
            .failures
            .lock()
            .expect("should succeed")
            .insert(event_id.as_bytes().to_vec(), failures);
    }

    /// Every attempt for this event fails.
    pub fn fail_forever(
        &self,
        event_id: &EventId,
    ) {
        self.fail_times(event_id, usize::MAX);
    }

    /// Successfully handled events, in completion order.
    pub fn handled_events(&self) -> Vec<ChangeEvent> {
        self.inner.handled.lock().expect("should succeed").clone()
    }

    pub fn handled_ids(&self) -> Vec<EventId> {
        self.handled_events().into_iter().map(|event| event.id).collect()
    }

    /// Total invocations for one event, failures included.
    pub fn attempts(
        &self,
        event_id: &EventId,
    ) -> usize {
        self.inner
            .attempts
            .lock()
            .expect("should succeed")
            .get(event_id.as_bytes())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChangeHandler for RecordingHandler {
    async fn handle(
        &self,
        event: &ChangeEvent,
    ) -> std::result::Result<(), HandlerError> {
        {
            let mut attempts = self.inner.attempts.lock().expect("should succeed");
            *attempts.entry(event.id.as_bytes().to_vec()).or_insert(0) += 1;
        }

        let should_fail = {
            let mut failures = self.inner.failures.lock().expect("should succeed");
            match failures.get_mut(event.id.as_bytes()) {
                Some(remaining) if *remaining > 0 => {
                    if *remaining != usize::MAX {
                        *remaining -= 1;
                    }
                    true
                }
                _ => false,
            }
        };

        if should_fail {
            return Err(HandlerError::Failed(format!(
                "scripted failure for {:?}",
                String::from_utf8_lossy(event.id.as_bytes())
            )));
        }

        self.inner.handled.lock().expect("should succeed").push(event.clone());
        Ok(())
    }
}
