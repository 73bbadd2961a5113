use std::time::Duration;

use tokio::time::Instant;

/// Where the watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    /// Competing for the lease
    Acquiring,
    /// Holding the lease and consuming the stream
    Owning,
    /// Giving the lease back (handover or shutdown)
    Draining,
    /// Tearing the session down before competing again
    Restarting,
    /// Terminal: a store failed and the loop is returning the error
    Fatal,
}

/// Why an ownership epoch ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EpochExit {
    /// Ownership outlived its configured maximum
    Rotation,
    /// The store stopped recognizing us as the holder
    LeaseLost,
    /// The stream failed or ended and must be reopened
    StreamTrouble,
    /// The caller asked the watcher to stop
    Shutdown,
}

impl EpochExit {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            EpochExit::Rotation => "rotation",
            EpochExit::LeaseLost => "lease_lost",
            EpochExit::StreamTrouble => "stream_trouble",
            EpochExit::Shutdown => "shutdown",
        }
    }
}

/// Decision after one failed handler attempt under a bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    Retry,
    Abandon,
}

/// True once the epoch has outlived the configured ownership budget.
pub(crate) fn rotation_due(
    epoch_started_at: Instant,
    now: Instant,
    ownership_max: Option<Duration>,
) -> bool {
    match ownership_max {
        Some(max) => now.duration_since(epoch_started_at) > max,
        None => false,
    }
}

/// Retry while the durable failure count stays within the bound.
///
/// `durable_count` is the value after the increment for the attempt that
/// just failed, so a bound of K allows the initial attempt plus K retries.
pub(crate) fn retry_decision(
    max_retries: u64,
    durable_count: u64,
) -> RetryDecision {
    if durable_count <= max_retries {
        RetryDecision::Retry
    } else {
        RetryDecision::Abandon
    }
}

/// Next phase after a non-fatal epoch exit.
pub(crate) fn phase_after_exit(exit: EpochExit) -> WatcherPhase {
    match exit {
        EpochExit::Rotation | EpochExit::Shutdown => WatcherPhase::Draining,
        EpochExit::LeaseLost | EpochExit::StreamTrouble => WatcherPhase::Restarting,
    }
}
