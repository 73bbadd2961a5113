use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use solewatch::ChangeEvent;
use solewatch::ChangeHandler;
use solewatch::ChangeStream;
use solewatch::EventId;
use solewatch::EventSource;
use solewatch::HandlerError;
use solewatch::LeaseConfig;
use solewatch::OperationKind;
use solewatch::StreamError;
use solewatch::StreamRequest;
use solewatch::WatcherConfig;
use tokio::sync::Notify;
use tokio::time::sleep;

/// Lease timings short enough for wall-clock integration runs.
pub fn short_lease_config() -> WatcherConfig {
    WatcherConfig {
        lease: LeaseConfig {
            ttl_ms: 2_000,
            renew_interval_ms: 500,
            acquire_retry_interval_ms: 100,
        },
        ..Default::default()
    }
}

pub fn make_event(seq: u64) -> ChangeEvent {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("should succeed")
        .as_millis() as u64;

    ChangeEvent {
        id: EventId::new(format!("it-evt-{seq:08}").into_bytes()),
        operation: OperationKind::Insert,
        document_key: format!("doc-{seq}").into_bytes(),
        full_document: Some(format!("{{\"seq\":{seq}}}").into_bytes()),
        timestamp_ms,
        update_description: None,
    }
}

/// Polls `predicate` until it holds or ten wall-clock seconds pass.
pub async fn eventually(
    description: &str,
    predicate: impl Fn() -> bool,
) {
    for _ in 0..500 {
        if predicate() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting until {description}");
}

struct FeedInner {
    log: Mutex<Vec<ChangeEvent>>,
    notify: Notify,
    sessions: AtomicUsize,
}

/// An appendable in-process change feed shared by every watcher under test.
#[derive(Clone)]
pub struct FeedSource {
    inner: Arc<FeedInner>,
}

impl FeedSource {
    pub fn new() -> Self {
        FeedSource {
            inner: Arc::new(FeedInner {
                log: Mutex::new(Vec::new()),
                notify: Notify::new(),
                sessions: AtomicUsize::new(0),
            }),
        }
    }

    pub fn push(
        &self,
        event: ChangeEvent,
    ) {
        self.inner.log.lock().expect("should succeed").push(event);
        self.inner.notify.notify_one();
    }

    pub fn sessions_opened(&self) -> usize {
        self.inner.sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for FeedSource {
    async fn open(
        &self,
        request: &StreamRequest,
    ) -> Result<Box<dyn ChangeStream>, StreamError> {
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
        Ok(Box::new(FeedStream {
            inner: self.inner.clone(),
            cursor,
        }))
    }
}

struct FeedStream {
    inner: Arc<FeedInner>,
    cursor: usize,
}

#[async_trait]
impl ChangeStream for FeedStream {
    async fn next(&mut self) -> Result<Option<ChangeEvent>, StreamError> {
        loop {
            {
                let log = self.inner.log.lock().expect("should succeed");
                if self.cursor < log.len() {
                    let event = log[self.cursor].clone();
                    self.cursor += 1;
                    return Ok(Some(event));
                }
            }
            self.inner.notify.notified().await;
        }
    }
}

/// Records which event ids reached it, nothing more.
#[derive(Clone)]
pub struct CountingHandler {
    handled: Arc<Mutex<Vec<EventId>>>,
}

impl CountingHandler {
    pub fn new() -> Self {
        CountingHandler {
            handled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn handled_ids(&self) -> Vec<EventId> {
        self.handled.lock().expect("should succeed").clone()
    }
}

#[async_trait]
impl ChangeHandler for CountingHandler {
    async fn handle(
        &self,
        event: &ChangeEvent,
    ) -> Result<(), HandlerError> {
        self.handled.lock().expect("should succeed").push(event.id.clone());
        Ok(())
    }
}
