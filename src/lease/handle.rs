use std::sync::Arc;
use std::time::Duration;

use super::Lease;
use super::LeaseStore;
use super::RefreshOutcome;
use crate::Result;

/// A held lease bound to its store.
///
/// Cheap to clone; the renewal task and the watch loop each keep one.
#[derive(Clone)]
pub struct LeaseHandle {
    store: Arc<dyn LeaseStore>,
    lease: Lease,
    ttl: Duration,
}

impl LeaseHandle {
    pub(crate) fn new(
        store: Arc<dyn LeaseStore>,
        lease: Lease,
        ttl: Duration,
    ) -> Self {
        LeaseHandle { store, lease, ttl }
    }

    pub fn lease(&self) -> &Lease {
        &self.lease
    }

    pub fn resource(&self) -> &str {
        &self.lease.resource
    }

    pub fn holder(&self) -> &str {
        &self.lease.holder
    }

    /// Extends the lease to its full TTL again.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.store.refresh(&self.lease, self.ttl).await
    }

    /// Gives the lease back so the next acquirer can take over.
    pub async fn release(&self) -> Result<()> {
        self.store.release(&self.lease).await
    }
}

impl std::fmt::Debug for LeaseHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LeaseHandle")
            .field("lease", &self.lease)
            .field("ttl", &self.ttl)
            .finish()
    }
}
