use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::warn;

use super::LeaseHandle;
use super::RefreshOutcome;
use crate::metrics::LEASE_RENEWALS_METRIC;
use crate::Error;

/// Why the renewal task gave up.
#[derive(Debug)]
pub enum RenewFault {
    /// The store stopped recognizing this holder
    Lost,
    /// The store itself failed
    Store(Error),
}

/// Background task keeping a held lease alive.
///
/// Refreshes immediately on spawn and then once per interval until stopped
/// or faulted. At most one fault is ever reported; after reporting, the
/// task exits and the lease is left to lapse on its own.
pub struct LeaseRenewer {
    fault_rx: mpsc::Receiver<RenewFault>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LeaseRenewer {
    pub fn spawn(
        watcher_id: &str,
        handle: LeaseHandle,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (fault_tx, fault_rx) = mpsc::channel(1);

        let task = tokio::spawn(renew_loop(
            watcher_id.to_string(),
            handle,
            interval,
            fault_tx,
            cancel.clone(),
        ));

        LeaseRenewer {
            fault_rx,
            cancel,
            task,
        }
    }

    /// Waits until the renewal task faults.
    ///
    /// `None` means the task ended without reporting, which only happens
    /// after [`LeaseRenewer::stop`].
    pub async fn fault(&mut self) -> Option<RenewFault> {
        self.fault_rx.recv().await
    }

    /// Non-blocking fault check.
    pub fn try_fault(&mut self) -> Option<RenewFault> {
        self.fault_rx.try_recv().ok()
    }

    /// True once the background task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task and waits for it to finish.
    ///
    /// Must complete before the lease is released so the task cannot
    /// resurrect a lock the next holder already took.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("lease renewer task join failed: {:?}", e);
        }
    }
}

async fn renew_loop(
    watcher_id: String,
    handle: LeaseHandle,
    interval: Duration,
    fault_tx: mpsc::Sender<RenewFault>,
    cancel: CancellationToken,
) {
    loop {
        match handle.refresh().await {
            Ok(RefreshOutcome::Renewed) => {
                LEASE_RENEWALS_METRIC
                    .with_label_values(&[&watcher_id, "renewed"])
                    .inc();
                debug!("[Watcher:{}] lease renewed on {}", watcher_id, handle.resource());
            }
            Ok(RefreshOutcome::Lost) => {
                LEASE_RENEWALS_METRIC
                    .with_label_values(&[&watcher_id, "lost"])
                    .inc();
                warn!("[Watcher:{}] lease lost during renewal", watcher_id);
                let _ = fault_tx.try_send(RenewFault::Lost);
                return;
            }
            Err(e) => {
                LEASE_RENEWALS_METRIC
                    .with_label_values(&[&watcher_id, "error"])
                    .inc();
                error!("[Watcher:{}] lease renewal failed: {:?}", watcher_id, e);
                let _ = fault_tx.try_send(RenewFault::Store(e));
                return;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("[Watcher:{}] lease renewer stopped", watcher_id);
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
