use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::checkpoint::CheckpointStore;
use crate::config::WatcherConfig;
use crate::event::EventFilter;
use crate::event::EventSource;
use crate::watcher::ChangeHandler;
use crate::watcher::ChangeWatcher;
use crate::LeaseStore;
use crate::Result;

/// Shared wiring for watchers backed by the same store clients.
///
/// The configuration is validated once here; every watcher the factory
/// creates shares the stores and the shutdown token. Store clients are
/// injected by the caller, so one factory can stand behind any backend
/// implementing the two store traits.
pub struct WatcherFactory {
    config: WatcherConfig,
    lease_store: Arc<dyn LeaseStore>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    shutdown: CancellationToken,
}

impl WatcherFactory {
    /// Validates `config` and captures the shared store clients.
    pub fn new(
        lease_store: Arc<dyn LeaseStore>,
        checkpoint_store: Arc<dyn CheckpointStore>,
        config: WatcherConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(WatcherFactory {
            config,
            lease_store,
            checkpoint_store,
            shutdown: CancellationToken::new(),
        })
    }

    /// Replaces the shutdown token so watchers stop on the caller's signal.
    pub fn with_shutdown(
        mut self,
        shutdown: CancellationToken,
    ) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Token that stops every watcher created by this factory.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Builds a watcher competing under `watcher_id`.
    ///
    /// The watcher does nothing until [`ChangeWatcher::watch`] is awaited.
    pub fn create_watcher<S, H>(
        &self,
        source: S,
        filter: EventFilter,
        watcher_id: &str,
        handler: H,
    ) -> ChangeWatcher<S, H>
    where
        S: EventSource,
        H: ChangeHandler,
    {
        debug!("[Watcher:{}] assembled", watcher_id);
        ChangeWatcher::new(
            watcher_id.to_string(),
            self.config.clone(),
            self.lease_store.clone(),
            self.checkpoint_store.clone(),
            source,
            filter,
            handler,
            self.shutdown.clone(),
        )
    }
}
