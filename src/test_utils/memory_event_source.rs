use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::event::ChangeEvent;
use crate::event::ChangeStream;
use crate::event::EventFilter;
use crate::event::EventSource;
use crate::event::StreamRequest;
use crate::StreamError;

enum ScriptedFault {
    Error(StreamError),
    End,
}

#[derive(Default)]
struct SourceInner {
    log: Mutex<Vec<ChangeEvent>>,
    notify: Notify,
    open_faults: Mutex<VecDeque<StreamError>>,
    drain_faults: Mutex<VecDeque<ScriptedFault>>,
    sessions: AtomicUsize,
}

/// Scriptable event source over an append-only in-memory log.
///
/// Sessions resume after the requested checkpoint and block on `next`
/// until an event is pushed. Scripted faults are reported once the open
/// session has drained every available event.
#[derive(Clone, Default)]
pub struct MemoryEventSource {
    inner: Arc<SourceInner>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event and wakes a blocked session.
    pub fn push(
        &self,
        event: ChangeEvent,
    ) {
        self.inner.log.lock().expect("should succeed").push(event);
        self.inner.notify.notify_one();
    }

    pub fn push_all(
        &self,
        events: impl IntoIterator<Item = ChangeEvent>,
    ) {
        for event in events {
            self.push(event);
        }
    }

    /// Makes the next open attempt fail.
    pub fn fail_next_open(
        &self,
        error: StreamError,
    ) {
        self.inner
            .open_faults
            .lock()
            .expect("should succeed")
            .push_back(error);
    }

    /// Makes the open session report an error after draining the log.
    pub fn fail_after_drain(
        &self,
        error: StreamError,
    ) {
        self.inner
            .drain_faults
            .lock()
            .expect("should succeed")
            .push_back(ScriptedFault::Error(error));
        self.inner.notify.notify_one();
    }

    /// Makes the open session complete after draining the log.
    pub fn end_after_drain(&self) {
        self.inner
            .drain_faults
            .lock()
            .expect("should succeed")
            .push_back(ScriptedFault::End);
        self.inner.notify.notify_one();
    }

    /// How many sessions were opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.inner.sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn open(
        &self,
        request: &StreamRequest,
    ) -> std::result::Result<Box<dyn ChangeStream>, StreamError> {
        if let Some(error) = self.inner.open_faults.lock().expect("should succeed").pop_front() {
            return Err(error);
        }

        let cursor = match &request.resume_after {
            Some(checkpoint) => {
                let log = self.inner.log.lock().expect("should succeed");
                log.iter()
                    .position(|event| event.id.as_bytes() == checkpoint.as_bytes())
                    .map(|index| index + 1)
                    .unwrap_or(0)
            }
            None => 0,
        };

        self.inner.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryChangeStream {
            inner: self.inner.clone(),
            cursor,
            filter: request.filter.clone(),
            attach_full_document: request.attach_full_document,
        }))
    }
}

pub struct MemoryChangeStream {
    inner: Arc<SourceInner>,
    cursor: usize,
    filter: EventFilter,
    attach_full_document: bool,
}

#[async_trait]
impl ChangeStream for MemoryChangeStream {
    async fn next(&mut self) -> std::result::Result<Option<ChangeEvent>, StreamError> {
        loop {
            loop {
                let candidate = {
                    let log = self.inner.log.lock().expect("should succeed");
                    if self.cursor < log.len() {
                        let event = log[self.cursor].clone();
                        self.cursor += 1;
                        Some(event)
                    } else {
                        None
                    }
                };

                match candidate {
                    Some(mut event) => {
                        if !self.filter.matches(&event) {
                            continue;
                        }
                        if !self.attach_full_document {
                            event.full_document = None;
                        }
                        return Ok(Some(event));
                    }
                    None => break,
                }
            }

            let fault = self.inner.drain_faults.lock().expect("should succeed").pop_front();
            match fault {
                Some(ScriptedFault::Error(error)) => return Err(error),
                Some(ScriptedFault::End) => return Ok(None),
                None => {}
            }

            self.inner.notify.notified().await;
        }
    }
}
