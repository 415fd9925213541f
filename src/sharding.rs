use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::coordination::CoordinationClient;
use crate::error::{Result, SentinelError};
use crate::job::JobName;
use crate::server::ServerNode;
use crate::storage::JobNodeStorage;

/// Shard items owned by one host.
pub type ShardingItemSet = BTreeSet<u32>;

#[async_trait]
pub trait Sharding: Send + Sync {
    /// Shard items currently assigned to the local host.
    async fn local_sharding_items(&self) -> Result<ShardingItemSet>;
}

/// [`Sharding`] that reads the assignment written by the leader to
/// `servers/{host}/sharding` as comma-separated items.
pub struct ShardingService {
    storage: JobNodeStorage,
    server_node: ServerNode,
}

impl ShardingService {
    pub fn new(client: Arc<dyn CoordinationClient>, job_name: &JobName, host: &str) -> Self {
        Self {
            storage: JobNodeStorage::new(client, job_name),
            server_node: ServerNode::new(job_name, host),
        }
    }

    /// Store an assignment for the local host. Normally written by the leader.
    pub async fn assign(&self, items: &ShardingItemSet) -> Result<()> {
        self.storage
            .replace_job_node(&self.server_node.sharding_node(), &format_items(items))
            .await
    }
}

#[async_trait]
impl Sharding for ShardingService {
    async fn local_sharding_items(&self) -> Result<ShardingItemSet> {
        let node = self.server_node.sharding_node();
        match self.storage.get_job_node_data(&node).await? {
            Some(value) => parse_items(&value).ok_or_else(|| SentinelError::InvalidShardingData {
                path: self.storage.job_path().full_path(&node),
                value,
            }),
            None => Ok(ShardingItemSet::new()),
        }
    }
}

pub fn format_items(items: &ShardingItemSet) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_items(value: &str) -> Option<ShardingItemSet> {
    if value.trim().is_empty() {
        return Some(ShardingItemSet::new());
    }
    value
        .split(',')
        .map(|item| item.trim().parse::<u32>().ok())
        .collect()
}
