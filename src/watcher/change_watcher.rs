use std::sync::Arc;

use autometrics::autometrics;
#[cfg(test)]
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::phase_after_exit;
use super::retry_decision;
use super::rotation_due;
use super::ChangeHandler;
use super::EpochExit;
use super::RetryDecision;
use super::WatcherPhase;
use crate::checkpoint::Checkpoint;
use crate::checkpoint::CheckpointStore;
use crate::config::WatcherConfig;
use crate::constants::LEASE_KEY_PREFIX;
use crate::event::ChangeEvent;
use crate::event::EventFilter;
use crate::event::EventSource;
use crate::event::StreamRequest;
use crate::lease::AcquireOutcome;
use crate::lease::LeaseHandle;
use crate::lease::LeaseRenewer;
use crate::lease::LeaseStore;
use crate::lease::RefreshOutcome;
use crate::lease::RenewFault;
use crate::metrics::ACQUIRE_ATTEMPTS_METRIC;
use crate::metrics::EPOCH_EXITS_METRIC;
use crate::metrics::EVENTS_HANDLED_METRIC;
use crate::metrics::HANDLER_RETRIES_METRIC;
use crate::metrics::HANDLE_DURATION_METRIC;
use crate::metrics::OWNERSHIP_ACTIVE_METRIC;
use crate::Result;
use crate::WatchError;
use crate::API_SLO;

/// Outcome of the retry loop for one delivered event.
enum HandledEvent {
    /// The handler decision is final, persist the checkpoint
    Checkpoint,
    /// The epoch ended mid-retry, leave the event un-checkpointed
    Interrupted(EpochExit),
}

/// An exclusive watcher bound to one identity, source and handler.
///
/// [`ChangeWatcher::watch`] blocks for the watcher's whole lifetime: it
/// competes for the lease, drains the stream while owning it, and starts
/// over after a handover, lease loss or stream trouble. It returns `Ok`
/// only once the shutdown token fires, and `Err` only on a store failure.
pub struct ChangeWatcher<S, H>
where
    S: EventSource,
    H: ChangeHandler,
{
    watcher_id: String,
    config: WatcherConfig,
    lease_store: Arc<dyn LeaseStore>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    source: S,
    filter: EventFilter,
    handler: H,
    shutdown: CancellationToken,

    // For unit test
    #[cfg(test)]
    phase_listeners: Vec<mpsc::UnboundedSender<WatcherPhase>>,
}

impl<S, H> ChangeWatcher<S, H>
where
    S: EventSource,
    H: ChangeHandler,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        watcher_id: String,
        config: WatcherConfig,
        lease_store: Arc<dyn LeaseStore>,
        checkpoint_store: Arc<dyn CheckpointStore>,
        source: S,
        filter: EventFilter,
        handler: H,
        shutdown: CancellationToken,
    ) -> Self {
        ChangeWatcher {
            watcher_id,
            config,
            lease_store,
            checkpoint_store,
            source,
            filter,
            handler,
            shutdown,

            #[cfg(test)]
            phase_listeners: Vec::new(),
        }
    }

    /// Identity this watcher competes under.
    pub fn watcher_id(&self) -> &str {
        &self.watcher_id
    }

    /// Runs the ownership loop until shutdown or a fatal store failure.
    #[autometrics(objective = API_SLO)]
    pub async fn watch(self) -> Result<()> {
        info!(
            "[Watcher:{}] starting watch loop on {}{}",
            self.watcher_id, LEASE_KEY_PREFIX, self.watcher_id
        );

        loop {
            self.set_phase(WatcherPhase::Acquiring);

            let handle = match self.acquire_lease().await {
                Ok(Some(handle)) => handle,
                Ok(None) => {
                    info!("[Watcher:{}] shutdown while acquiring", self.watcher_id);
                    return Ok(());
                }
                Err(e) => {
                    self.set_phase(WatcherPhase::Fatal);
                    error!("[Watcher:{}] lease acquisition failed: {:?}", self.watcher_id, e);
                    return Err(e);
                }
            };

            match self.own_epoch(handle).await {
                Ok(EpochExit::Shutdown) => {
                    info!("[Watcher:{}] shutdown complete", self.watcher_id);
                    return Ok(());
                }
                Ok(exit) => {
                    debug!("[Watcher:{}] re-entering acquisition after {:?}", self.watcher_id, exit);
                }
                Err(e) => {
                    self.set_phase(WatcherPhase::Fatal);
                    error!("[Watcher:{}] fatal error, giving up: {:?}", self.watcher_id, e);
                    return Err(e);
                }
            }
        }
    }

    /// Competes for the lease until it is won or shutdown is requested.
    ///
    /// `Busy` is a normal race outcome, retried forever at a fixed pace.
    async fn acquire_lease(&self) -> Result<Option<LeaseHandle>> {
        let resource = format!("{}{}", LEASE_KEY_PREFIX, self.watcher_id);
        let ttl = self.config.lease.ttl();

        loop {
            if self.shutdown.is_cancelled() {
                return Ok(None);
            }

            match self.lease_store.acquire(&resource, ttl).await? {
                AcquireOutcome::Acquired(lease) => {
                    ACQUIRE_ATTEMPTS_METRIC
                        .with_label_values(&[&self.watcher_id, "acquired"])
                        .inc();
                    info!(
                        "[Watcher:{}] lease acquired as holder {}",
                        self.watcher_id, lease.holder
                    );
                    return Ok(Some(LeaseHandle::new(self.lease_store.clone(), lease, ttl)));
                }
                AcquireOutcome::Busy => {
                    ACQUIRE_ATTEMPTS_METRIC
                        .with_label_values(&[&self.watcher_id, "busy"])
                        .inc();
                    debug!(
                        "[Watcher:{}] lease busy, retrying in {:?}",
                        self.watcher_id,
                        self.config.lease.acquire_retry_interval()
                    );
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => return Ok(None),
                        _ = sleep(self.config.lease.acquire_retry_interval()) => {}
                    }
                }
            }
        }
    }

    /// One ownership epoch: renewer up, stream drained, session torn down.
    async fn own_epoch(
        &self,
        handle: LeaseHandle,
    ) -> Result<EpochExit> {
        self.set_phase(WatcherPhase::Owning);
        OWNERSHIP_ACTIVE_METRIC
            .with_label_values(&[&self.watcher_id])
            .set(1.0);

        let mut renewer = LeaseRenewer::spawn(
            &self.watcher_id,
            handle.clone(),
            self.config.lease.renew_interval(),
        );

        let outcome = self.consume_until_exit(&handle, &mut renewer).await;

        OWNERSHIP_ACTIVE_METRIC
            .with_label_values(&[&self.watcher_id])
            .set(0.0);

        let exit = match outcome {
            Ok(exit) => exit,
            Err(e) => {
                EPOCH_EXITS_METRIC
                    .with_label_values(&[&self.watcher_id, "fatal"])
                    .inc();
                renewer.stop().await;
                if let Err(release_err) = handle.release().await {
                    error!(
                        "[Watcher:{}] release after fatal error failed: {:?}",
                        self.watcher_id, release_err
                    );
                }
                return Err(e);
            }
        };

        EPOCH_EXITS_METRIC
            .with_label_values(&[&self.watcher_id, exit.as_label()])
            .inc();
        self.set_phase(phase_after_exit(exit));

        match exit {
            EpochExit::Rotation => {
                info!(
                    "[Watcher:{}] ownership expired, handing the stream over",
                    self.watcher_id
                );
                renewer.stop().await;
                handle.release().await?;

                // pause so waiting peers win the next race instead of us
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => return Ok(EpochExit::Shutdown),
                    _ = sleep(self.config.lease.acquire_retry_interval()) => {}
                }

                self.set_phase(WatcherPhase::Restarting);
                Ok(EpochExit::Rotation)
            }
            EpochExit::LeaseLost => {
                warn!("[Watcher:{}] lease lost, restarting", self.watcher_id);
                renewer.stop().await;
                Ok(EpochExit::LeaseLost)
            }
            EpochExit::StreamTrouble => {
                warn!("[Watcher:{}] closing and restarting", self.watcher_id);
                renewer.stop().await;
                handle.release().await?;
                Ok(EpochExit::StreamTrouble)
            }
            EpochExit::Shutdown => {
                info!("[Watcher:{}] shutdown requested, draining", self.watcher_id);
                renewer.stop().await;
                if let Err(e) = handle.release().await {
                    warn!(
                        "[Watcher:{}] release on shutdown failed, lease will lapse: {:?}",
                        self.watcher_id, e
                    );
                }
                Ok(EpochExit::Shutdown)
            }
        }
    }

    /// The consume cycle: refresh, rotation check, renewer check, next
    /// event, handler, checkpoint.
    async fn consume_until_exit(
        &self,
        handle: &LeaseHandle,
        renewer: &mut LeaseRenewer,
    ) -> Result<EpochExit> {
        let resume_after = self.checkpoint_store.get_checkpoint(&self.watcher_id).await?;
        let request = StreamRequest {
            filter: self.filter.clone(),
            resume_after,
            attach_full_document: self.config.attach_full_document,
        };

        let mut stream = self
            .source
            .open(&request)
            .await
            .map_err(WatchError::StreamOpen)?;
        info!("[Watcher:{}] watcher created", self.watcher_id);

        let epoch_started_at = Instant::now();

        loop {
            // P0: prove we still hold the lease before consuming
            match handle.refresh().await? {
                RefreshOutcome::Renewed => {}
                RefreshOutcome::Lost => return Ok(EpochExit::LeaseLost),
            }

            // P1: voluntary handover once ownership ran long enough
            if rotation_due(epoch_started_at, Instant::now(), self.config.ownership_max_duration()) {
                return Ok(EpochExit::Rotation);
            }

            // P2: anything the background renewer reported meanwhile
            if let Some(fault) = renewer.try_fault() {
                match fault {
                    RenewFault::Lost => return Ok(EpochExit::LeaseLost),
                    RenewFault::Store(e) => return Err(e),
                }
            } else if renewer.is_finished() {
                // a finished task has already flushed any fault into the channel
                match renewer.try_fault() {
                    Some(RenewFault::Lost) => return Ok(EpochExit::LeaseLost),
                    Some(RenewFault::Store(e)) => return Err(e),
                    None => return Err(WatchError::RenewerGone.into()),
                }
            }

            // P3: wait for the next event; the only long block in the cycle
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(EpochExit::Shutdown),
                next = stream.next() => match next {
                    Ok(Some(event)) => event,
                    Ok(None) => {
                        warn!("[Watcher:{}] stream ended", self.watcher_id);
                        return Ok(EpochExit::StreamTrouble);
                    }
                    Err(e) => {
                        warn!("[Watcher:{}] stream error occurred: {}", self.watcher_id, e);
                        return Ok(EpochExit::StreamTrouble);
                    }
                },
            };

            match self.handle_event(&event, renewer).await? {
                HandledEvent::Checkpoint => {
                    let checkpoint = Checkpoint::from(&event.id);
                    self.checkpoint_store
                        .put_checkpoint(&self.watcher_id, &checkpoint)
                        .await?;
                    EVENTS_HANDLED_METRIC
                        .with_label_values(&[&self.watcher_id])
                        .inc();
                }
                HandledEvent::Interrupted(exit) => return Ok(exit),
            }
        }
    }

    /// Invokes the handler for one event under the configured retry policy.
    ///
    /// With a bound of K the handler runs at most K+1 times; the durable
    /// counter carries failed attempts across epochs. A bound of zero
    /// retries forever without touching the counter.
    async fn handle_event(
        &self,
        event: &ChangeEvent,
        renewer: &mut LeaseRenewer,
    ) -> Result<HandledEvent> {
        let started_at = Instant::now();

        loop {
            match self.handler.handle(event).await {
                Ok(()) => {
                    HANDLE_DURATION_METRIC
                        .with_label_values(&[&self.watcher_id])
                        .observe(started_at.elapsed().as_millis() as f64);
                    return Ok(HandledEvent::Checkpoint);
                }
                Err(e) => {
                    HANDLER_RETRIES_METRIC
                        .with_label_values(&[&self.watcher_id])
                        .inc();
                    warn!("[Watcher:{}] handler failed: {}", self.watcher_id, e);

                    if self.config.max_retries > 0 {
                        let attempts = self.checkpoint_store.increment_retry(&event.id).await?;
                        if let RetryDecision::Abandon =
                            retry_decision(self.config.max_retries, attempts)
                        {
                            warn!(
                                "[Watcher:{}] abandoning event after {} failed attempts",
                                self.watcher_id, attempts
                            );
                            return Ok(HandledEvent::Checkpoint);
                        }
                    }

                    // a poison event must not wedge teardown
                    if self.shutdown.is_cancelled() {
                        return Ok(HandledEvent::Interrupted(EpochExit::Shutdown));
                    }
                    if let Some(fault) = renewer.try_fault() {
                        match fault {
                            RenewFault::Lost => {
                                return Ok(HandledEvent::Interrupted(EpochExit::LeaseLost))
                            }
                            RenewFault::Store(e) => return Err(e),
                        }
                    }
                }
            }
        }
    }

    fn set_phase(
        &self,
        phase: WatcherPhase,
    ) {
        debug!("[Watcher:{}] entering {:?}", self.watcher_id, phase);

        #[cfg(test)]
        self.notify_phase_transition(phase);
    }

    #[cfg(test)]
    pub(crate) fn register_phase_listener(
        &mut self,
        tx: mpsc::UnboundedSender<WatcherPhase>,
    ) {
        self.phase_listeners.push(tx);
    }

    #[cfg(test)]
    fn notify_phase_transition(
        &self,
        phase: WatcherPhase,
    ) {
        for tx in &self.phase_listeners {
            tx.send(phase).expect("should succeed");
        }
    }
}
