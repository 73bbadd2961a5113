use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// A granted lease: the guarded resource key plus the holder token minted
/// for this grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub resource: String,
    pub holder: String,
}

/// Result of an acquire attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The resource is ours until the TTL lapses
    Acquired(Lease),
    /// Another live holder owns the resource right now
    Busy,
}

/// Result of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The TTL was extended to the full duration again
    Renewed,
    /// The store no longer recognizes this holder
    Lost,
}

/// TTL lease store providing mutual exclusion across processes.
///
/// `acquire` mints a fresh holder token per grant. `refresh` and `release`
/// only act while the stored holder still matches; once the lease lapsed
/// and someone else took it, both leave the new grant untouched.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LeaseStore: Send + Sync + 'static {
    /// Tries to take the lease on `resource` for `ttl`.
    async fn acquire(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> Result<AcquireOutcome>;

    /// Extends a held lease to the full `ttl` again.
    async fn refresh(
        &self,
        lease: &Lease,
        ttl: Duration,
    ) -> Result<RefreshOutcome>;

    /// Deletes the lease if this holder still owns it.
    ///
    /// Releasing a lease another holder has since taken is a no-op.
    async fn release(
        &self,
        lease: &Lease,
    ) -> Result<()>;
}
