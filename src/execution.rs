use std::sync::Arc;

use async_trait::async_trait;

use crate::coordination::CoordinationClient;
use crate::error::Result;
use crate::job::JobName;
use crate::sharding::ShardingItemSet;
use crate::storage::JobNodeStorage;

/// Tracks which shard items are executing right now.
#[async_trait]
pub trait ExecutionTracking: Send + Sync {
    /// Mark `items` as not running. Used after an unclean disconnect, where
    /// stale running markers would block reassignment.
    async fn clear_running_info(&self, items: &ShardingItemSet) -> Result<()>;
}

/// [`ExecutionTracking`] backed by ephemeral `execution/{item}/running` nodes.
pub struct ExecutionService {
    storage: JobNodeStorage,
    monitor_execution: bool,
}

impl ExecutionService {
    pub fn new(
        client: Arc<dyn CoordinationClient>,
        job_name: &JobName,
        monitor_execution: bool,
    ) -> Self {
        Self {
            storage: JobNodeStorage::new(client, job_name),
            monitor_execution,
        }
    }

    /// Mark `items` as running. Called by the execution layer when a run starts.
    pub async fn register_running(&self, items: &ShardingItemSet) -> Result<()> {
        if !self.monitor_execution {
            return Ok(());
        }
        for item in items {
            self.storage.fill_ephemeral_job_node(&running_node(*item), "").await?;
        }
        Ok(())
    }

    pub async fn is_running(&self, item: u32) -> Result<bool> {
        self.storage.is_job_node_existed(&running_node(item)).await
    }
}

#[async_trait]
impl ExecutionTracking for ExecutionService {
    async fn clear_running_info(&self, items: &ShardingItemSet) -> Result<()> {
        if !self.monitor_execution {
            return Ok(());
        }
        for item in items {
            self.storage.remove_job_node_if_existed(&running_node(*item)).await?;
        }
        tracing::debug!(items = ?items, "Cleared running info");
        Ok(())
    }
}

fn running_node(item: u32) -> String {
    format!("execution/{}/running", item)
}
