use std::sync::Arc;

use async_trait::async_trait;
use autometrics::autometrics;
use tracing::error;

use crate::checkpoint::Checkpoint;
use crate::checkpoint::CheckpointStore;
use crate::constants::CHECKPOINTS_TREE;
use crate::constants::RETRY_COUNTERS_TREE;
use crate::utils::convert::counter_from_bytes;
use crate::utils::convert::counter_to_bytes;
use crate::EventId;
use crate::Result;
use crate::StorageError;
use crate::API_SLO;

/// Durable checkpoint and retry-counter store on two sled trees.
///
/// Checkpoint tokens are stored verbatim, keyed by watcher id. Retry
/// counters live in their own tree keyed by event id, so the two
/// keyspaces never collide.
#[derive(Clone)]
pub struct SledCheckpointStore {
    checkpoints: Arc<sled::Tree>,
    retries: Arc<sled::Tree>,
}

impl std::fmt::Debug for SledCheckpointStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledCheckpointStore")
            .field("checkpoints_len", &self.checkpoints.len())
            .field("retries_len", &self.retries.len())
            .finish()
    }
}

impl SledCheckpointStore {
    pub fn new(db: Arc<sled::Db>) -> Self {
        let checkpoints = match db.open_tree(CHECKPOINTS_TREE) {
            Ok(tree) => Arc::new(tree),
            Err(e) => {
                error!("Failed to open checkpoints tree: {}", e);
                panic!("failed to open sled tree: {}", e);
            }
        };
        let retries = match db.open_tree(RETRY_COUNTERS_TREE) {
            Ok(tree) => Arc::new(tree),
            Err(e) => {
                error!("Failed to open retry counters tree: {}", e);
                panic!("failed to open sled tree: {}", e);
            }
        };

        SledCheckpointStore { checkpoints, retries }
    }
}

#[async_trait]
impl CheckpointStore for SledCheckpointStore {
    #[autometrics(objective = API_SLO)]
    async fn get_checkpoint(
        &self,
        watcher_id: &str,
    ) -> Result<Option<Checkpoint>> {
        match self.checkpoints.get(watcher_id.as_bytes())? {
            Some(ivec) => Ok(Some(Checkpoint::new(ivec.to_vec()))),
            None => Ok(None),
        }
    }

    #[autometrics(objective = API_SLO)]
    async fn put_checkpoint(
        &self,
        watcher_id: &str,
        checkpoint: &Checkpoint,
    ) -> Result<()> {
        self.checkpoints.insert(watcher_id.as_bytes(), checkpoint.as_bytes())?;
        self.checkpoints.flush()?;
        Ok(())
    }

    #[autometrics(objective = API_SLO)]
    async fn increment_retry(
        &self,
        event_id: &EventId,
    ) -> Result<u64> {
        let updated = self
            .retries
            // a corrupt counter restarts the count
            .update_and_fetch(event_id.as_bytes(), |old| {
                let count = old.and_then(|bytes| counter_from_bytes(bytes).ok()).unwrap_or(0);
                Some(counter_to_bytes(count.saturating_add(1)).to_vec())
            })?
            .ok_or_else(|| StorageError::DbError("retry counter missing after update".to_string()))?;

        self.retries.flush()?;
        Ok(counter_from_bytes(&updated)?)
    }
}
