use std::sync::Arc;

use crate::coordination::CoordinationClient;
use crate::error::Result;
use crate::job::JobName;
use crate::path::JobNodePath;

/// Reads and writes nodes of a single job's subtree.
///
/// All node arguments are relative to the job root (`servers/h1/status`).
#[derive(Clone)]
pub struct JobNodeStorage {
    client: Arc<dyn CoordinationClient>,
    path: JobNodePath,
}

impl JobNodeStorage {
    pub fn new(client: Arc<dyn CoordinationClient>, job_name: &JobName) -> Self {
        Self {
            client,
            path: JobNodePath::new(job_name),
        }
    }

    pub fn job_path(&self) -> &JobNodePath {
        &self.path
    }

    pub async fn is_job_node_existed(&self, node: &str) -> Result<bool> {
        self.client.exists(&self.path.full_path(node)).await
    }

    pub async fn get_job_node_data(&self, node: &str) -> Result<Option<String>> {
        self.client.get(&self.path.full_path(node)).await
    }

    pub async fn create_job_node_if_needed(&self, node: &str) -> Result<()> {
        let path = self.path.full_path(node);
        if !self.client.exists(&path).await? {
            self.client.persist(&path, "").await?;
        }
        Ok(())
    }

    pub async fn replace_job_node(&self, node: &str, value: &str) -> Result<()> {
        self.client.persist(&self.path.full_path(node), value).await
    }

    pub async fn fill_ephemeral_job_node(&self, node: &str, value: &str) -> Result<()> {
        self.client
            .persist_ephemeral(&self.path.full_path(node), value)
            .await
    }

    /// Returns `true` if this call created the node.
    pub async fn create_ephemeral_job_node_if_absent(&self, node: &str, value: &str) -> Result<bool> {
        self.client
            .create_ephemeral_if_absent(&self.path.full_path(node), value)
            .await
    }

    pub async fn remove_job_node_if_existed(&self, node: &str) -> Result<()> {
        let path = self.path.full_path(node);
        if self.client.exists(&path).await? {
            self.client.remove(&path).await?;
        }
        Ok(())
    }
}
