use std::sync::Arc;

use async_trait::async_trait;

use crate::coordination::CoordinationClient;
use crate::error::Result;
use crate::job::JobName;
use crate::server::node::{ServerNode, READY};
use crate::storage::JobNodeStorage;

/// Per-host membership and operator flags of a job.
#[async_trait]
pub trait ServerRegistry: Send + Sync {
    /// Announce the local host as online. The record is session-scoped and
    /// disappears when the session expires.
    async fn mark_online(&self) -> Result<()>;

    /// Whether an operator has paused the job on this host.
    async fn is_paused_manually(&self) -> Result<bool>;

    async fn clear_paused_flag(&self) -> Result<()>;

    /// Whether an operator has asked the job on this host to shut down.
    async fn is_shutdown_requested(&self) -> Result<bool>;

    /// Record that the local scheduler has shut down.
    async fn on_shutdown(&self) -> Result<()>;
}

/// [`ServerRegistry`] backed by `/{job}/servers/{host}/*` nodes.
pub struct ServerService {
    storage: JobNodeStorage,
    server_node: ServerNode,
}

impl ServerService {
    pub fn new(client: Arc<dyn CoordinationClient>, job_name: &JobName, host: &str) -> Self {
        Self {
            storage: JobNodeStorage::new(client, job_name),
            server_node: ServerNode::new(job_name, host),
        }
    }

    pub async fn is_online(&self) -> Result<bool> {
        let status = self
            .storage
            .get_job_node_data(&self.server_node.status_node())
            .await?;
        Ok(status.as_deref() == Some(READY))
    }

    /// Set the operator pause flag for this host.
    pub async fn pause_manually(&self) -> Result<()> {
        self.storage
            .create_job_node_if_needed(&self.server_node.paused_node())
            .await
    }

    /// Set the operator shutdown flag for this host.
    pub async fn request_shutdown(&self) -> Result<()> {
        self.storage
            .create_job_node_if_needed(&self.server_node.shutdown_node())
            .await
    }
}

#[async_trait]
impl ServerRegistry for ServerService {
    async fn mark_online(&self) -> Result<()> {
        self.storage
            .fill_ephemeral_job_node(&self.server_node.status_node(), READY)
            .await?;
        tracing::debug!(host = self.server_node.host(), "Server marked online");
        Ok(())
    }

    async fn is_paused_manually(&self) -> Result<bool> {
        self.storage
            .is_job_node_existed(&self.server_node.paused_node())
            .await
    }

    async fn clear_paused_flag(&self) -> Result<()> {
        self.storage
            .remove_job_node_if_existed(&self.server_node.paused_node())
            .await
    }

    async fn is_shutdown_requested(&self) -> Result<bool> {
        self.storage
            .is_job_node_existed(&self.server_node.shutdown_node())
            .await
    }

    async fn on_shutdown(&self) -> Result<()> {
        self.storage
            .remove_job_node_if_existed(&self.server_node.status_node())
            .await?;
        tracing::info!(host = self.server_node.host(), "Server status removed after shutdown");
        Ok(())
    }
}
