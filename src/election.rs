use std::sync::Arc;

use async_trait::async_trait;

use crate::coordination::CoordinationClient;
use crate::error::Result;
use crate::job::JobName;
use crate::storage::JobNodeStorage;

const LEADER_HOST_NODE: &str = "leader/election/host";

/// Leader election for one job.
#[async_trait]
pub trait LeaderElection: Send + Sync {
    async fn has_leader(&self) -> Result<bool>;

    /// Attempt to become leader. Safe to call when a leader already exists.
    async fn run_election(&self) -> Result<()>;
}

/// [`LeaderElection`] where the first host to create the ephemeral
/// `leader/election/host` node wins. The node dies with the winner's
/// session, which reopens the election.
pub struct LeaderElectionService {
    storage: JobNodeStorage,
    host: String,
}

impl LeaderElectionService {
    pub fn new(client: Arc<dyn CoordinationClient>, job_name: &JobName, host: &str) -> Self {
        Self {
            storage: JobNodeStorage::new(client, job_name),
            host: host.to_string(),
        }
    }

    pub async fn leader_host(&self) -> Result<Option<String>> {
        self.storage.get_job_node_data(LEADER_HOST_NODE).await
    }

    pub async fn is_leader(&self) -> Result<bool> {
        Ok(self.leader_host().await?.as_deref() == Some(self.host.as_str()))
    }
}

#[async_trait]
impl LeaderElection for LeaderElectionService {
    async fn has_leader(&self) -> Result<bool> {
        self.storage.is_job_node_existed(LEADER_HOST_NODE).await
    }

    async fn run_election(&self) -> Result<()> {
        let elected = self
            .storage
            .create_ephemeral_job_node_if_absent(LEADER_HOST_NODE, &self.host)
            .await?;
        if elected {
            tracing::info!(host = %self.host, "Elected as job leader");
        } else {
            tracing::debug!(host = %self.host, "Leader already present, election skipped");
        }
        Ok(())
    }
}
