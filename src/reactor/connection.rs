use std::sync::Arc;

use crate::coordination::ConnectionState;
use crate::election::LeaderElection;
use crate::error::Result;
use crate::execution::ExecutionTracking;
use crate::job::JobName;
use crate::schedule::JobRegistry;
use crate::server::ServerRegistry;
use crate::sharding::Sharding;

/// Reconciles the local scheduler with the coordination session's state.
pub struct ConnectionStateHandler {
    job_name: JobName,
    election: Arc<dyn LeaderElection>,
    servers: Arc<dyn ServerRegistry>,
    sharding: Arc<dyn Sharding>,
    execution: Arc<dyn ExecutionTracking>,
    schedules: Arc<JobRegistry>,
}

impl ConnectionStateHandler {
    pub fn new(
        job_name: JobName,
        election: Arc<dyn LeaderElection>,
        servers: Arc<dyn ServerRegistry>,
        sharding: Arc<dyn Sharding>,
        execution: Arc<dyn ExecutionTracking>,
        schedules: Arc<JobRegistry>,
    ) -> Self {
        Self {
            job_name,
            election,
            servers,
            sharding,
            execution,
            schedules,
        }
    }

    pub async fn handle(&self, state: ConnectionState) -> Result<()> {
        match state {
            ConnectionState::Lost => {
                self.pause_local().await;
                Ok(())
            }
            ConnectionState::Reconnected => self.reconcile().await,
            // Not reconciliation points: a suspended session may still come
            // back intact, and the first connection precedes job start-up.
            ConnectionState::Connected | ConnectionState::Suspended => {
                tracing::debug!(job = %self.job_name, state = %state, "Connection state needs no action");
                Ok(())
            }
        }
    }

    /// The session is gone, so shard ownership can no longer be trusted.
    async fn pause_local(&self) {
        match self.schedules.controller_for(&self.job_name).await {
            Some(controller) => {
                tracing::warn!(job = %self.job_name, "Coordination session lost, pausing job");
                controller.pause();
            }
            None => {
                tracing::debug!(job = %self.job_name, "Session lost before job start, nothing to pause");
            }
        }
    }

    /// Steps run in order and the first failure aborts the rest.
    async fn reconcile(&self) -> Result<()> {
        tracing::info!(job = %self.job_name, "Coordination session re-established, reconciling");

        // Resumed work depends on shard assignment, which needs a leader.
        if !self.election.has_leader().await? {
            self.election.run_election().await?;
        }

        // The online record may have expired with the old session.
        self.servers.mark_online().await?;

        let items = self.sharding.local_sharding_items().await?;
        self.execution.clear_running_info(&items).await?;

        if self.servers.is_paused_manually().await? {
            tracing::info!(job = %self.job_name, "Job paused by operator, staying paused");
            return Ok(());
        }
        if let Some(controller) = self.schedules.controller_for(&self.job_name).await {
            controller.resume();
        }
        Ok(())
    }
}
