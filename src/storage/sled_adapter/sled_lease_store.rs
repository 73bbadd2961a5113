use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autometrics::autometrics;
use nanoid::nanoid;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;

use crate::constants::LEASE_RECORDS_TREE;
use crate::lease::AcquireOutcome;
use crate::lease::Lease;
use crate::lease::LeaseStore;
use crate::lease::RefreshOutcome;
use crate::utils::time::now_unix_ms;
use crate::Result;
use crate::StorageError;
use crate::API_SLO;

/// Stored form of a granted lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LeaseRecord {
    holder: String,
    expires_at_ms: u64,
}

impl LeaseRecord {
    fn is_live(
        &self,
        now_ms: u64,
    ) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// TTL lease store on a sled tree.
///
/// Gives the same observable behavior a remote lock service would:
/// `compare_and_swap` decides every race, and an expired record is
/// claimable in place without a separate reaper.
#[derive(Clone)]
pub struct SledLeaseStore {
    tree: Arc<sled::Tree>,
}

impl std::fmt::Debug for SledLeaseStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledLeaseStore")
            .field("tree_len", &self.tree.len())
            .finish()
    }
}

impl SledLeaseStore {
    pub fn new(db: Arc<sled::Db>) -> Self {
        match db.open_tree(LEASE_RECORDS_TREE) {
            Ok(tree) => SledLeaseStore { tree: Arc::new(tree) },
            Err(e) => {
                error!("Failed to open lease records tree: {}", e);
                panic!("failed to open sled tree: {}", e);
            }
        }
    }

    fn decode(bytes: &[u8]) -> Result<LeaseRecord> {
        Ok(bincode::deserialize(bytes).map_err(StorageError::BincodeError)?)
    }

    fn encode(record: &LeaseRecord) -> Result<Vec<u8>> {
        Ok(bincode::serialize(record).map_err(StorageError::BincodeError)?)
    }

    fn flush(&self) -> Result<()> {
        self.tree.flush()?;
        Ok(())
    }
}

#[async_trait]
impl LeaseStore for SledLeaseStore {
    #[autometrics(objective = API_SLO)]
    async fn acquire(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> Result<AcquireOutcome> {
        let now = now_unix_ms();
        let current = self.tree.get(resource.as_bytes())?;

        if let Some(ref bytes) = current {
            if Self::decode(bytes)?.is_live(now) {
                return Ok(AcquireOutcome::Busy);
            }
        }

        let record = LeaseRecord {
            holder: nanoid!(),
            expires_at_ms: now.saturating_add(ttl.as_millis() as u64),
        };
        let encoded = Self::encode(&record)?;

        match self
            .tree
            .compare_and_swap(resource.as_bytes(), current.as_ref(), Some(encoded))?
        {
            Ok(()) => {
                self.flush()?;
                debug!("lease on {} granted to holder {}", resource, record.holder);
                Ok(AcquireOutcome::Acquired(Lease {
                    resource: resource.to_string(),
                    holder: record.holder,
                }))
            }
            // a racer rewrote the record first
            Err(_) => Ok(AcquireOutcome::Busy),
        }
    }

    #[autometrics(objective = API_SLO)]
    async fn refresh(
        &self,
        lease: &Lease,
        ttl: Duration,
    ) -> Result<RefreshOutcome> {
        let now = now_unix_ms();
        let current = match self.tree.get(lease.resource.as_bytes())? {
            Some(ivec) => ivec,
            None => return Ok(RefreshOutcome::Lost),
        };

        let record = Self::decode(&current)?;
        if record.holder != lease.holder || !record.is_live(now) {
            return Ok(RefreshOutcome::Lost);
        }

        let renewed = LeaseRecord {
            holder: record.holder,
            expires_at_ms: now.saturating_add(ttl.as_millis() as u64),
        };
        let encoded = Self::encode(&renewed)?;

        match self
            .tree
            .compare_and_swap(lease.resource.as_bytes(), Some(&current), Some(encoded))?
        {
            Ok(()) => {
                self.flush()?;
                Ok(RefreshOutcome::Renewed)
            }
            Err(_) => Ok(RefreshOutcome::Lost),
        }
    }

    #[autometrics(objective = API_SLO)]
    async fn release(
        &self,
        lease: &Lease,
    ) -> Result<()> {
        let current = match self.tree.get(lease.resource.as_bytes())? {
            Some(ivec) => ivec,
            None => return Ok(()),
        };

        if Self::decode(&current)?.holder != lease.holder {
            debug!("lease on {} already moved to another holder", lease.resource);
            return Ok(());
        }

        match self
            .tree
            .compare_and_swap(lease.resource.as_bytes(), Some(&current), None::<&[u8]>)?
        {
            Ok(()) => self.flush(),
            // the record changed under us, nothing left to free
            Err(_) => Ok(()),
        }
    }
}
