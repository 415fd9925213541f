use std::sync::Arc;

use crate::coordination::{TreeEvent, TreeEventKind};
use crate::error::Result;
use crate::job::JobName;
use crate::schedule::JobRegistry;
use crate::server::{ServerNode, ServerRegistry};

/// Applies the local host's operator pause flag.
///
/// Removal of the flag clears it through [`ServerRegistry::clear_paused_flag`]
/// even when no controller is registered for the job, so a stale flag never
/// outlives the operator's unpause.
pub struct PausedFlagHandler {
    job_name: JobName,
    server_node: ServerNode,
    servers: Arc<dyn ServerRegistry>,
    schedules: Arc<JobRegistry>,
}

impl PausedFlagHandler {
    pub fn new(
        job_name: JobName,
        server_node: ServerNode,
        servers: Arc<dyn ServerRegistry>,
        schedules: Arc<JobRegistry>,
    ) -> Self {
        Self {
            job_name,
            server_node,
            servers,
            schedules,
        }
    }

    pub async fn handle(&self, event: &TreeEvent) -> Result<()> {
        if !self.server_node.is_local_paused_path(&event.path) {
            return Ok(());
        }
        let controller = self.schedules.controller_for(&self.job_name).await;
        match event.kind {
            TreeEventKind::NodeAdded => {
                tracing::info!(job = %self.job_name, "Pause flag set");
                if let Some(controller) = controller {
                    controller.pause();
                }
            }
            TreeEventKind::NodeRemoved => {
                // Authoritative unpause: the manual-pause state is not rechecked.
                tracing::info!(job = %self.job_name, "Pause flag cleared");
                if let Some(controller) = controller {
                    controller.resume();
                }
                self.servers.clear_paused_flag().await?;
            }
            TreeEventKind::NodeUpdated => {}
        }
        Ok(())
    }

    /// Re-read the flag after events were dropped. A set flag pauses the job;
    /// an absent one changes nothing, since the pause may come from elsewhere.
    pub async fn resync(&self) -> Result<()> {
        if !self.servers.is_paused_manually().await? {
            return Ok(());
        }
        if let Some(controller) = self.schedules.controller_for(&self.job_name).await {
            tracing::info!(job = %self.job_name, "Pause flag found on resync");
            controller.pause();
        }
        Ok(())
    }
}

/// Applies the local host's operator shutdown flag.
pub struct ShutdownFlagHandler {
    job_name: JobName,
    server_node: ServerNode,
    servers: Arc<dyn ServerRegistry>,
    schedules: Arc<JobRegistry>,
}

impl ShutdownFlagHandler {
    pub fn new(
        job_name: JobName,
        server_node: ServerNode,
        servers: Arc<dyn ServerRegistry>,
        schedules: Arc<JobRegistry>,
    ) -> Self {
        Self {
            job_name,
            server_node,
            servers,
            schedules,
        }
    }

    pub async fn handle(&self, event: &TreeEvent) -> Result<()> {
        if !self.server_node.is_local_shutdown_path(&event.path) {
            return Ok(());
        }
        match event.kind {
            TreeEventKind::NodeAdded => self.apply().await,
            // Shutdown is terminal; removing the flag does not restart the job.
            TreeEventKind::NodeRemoved | TreeEventKind::NodeUpdated => Ok(()),
        }
    }

    /// Re-read the flag after events were dropped.
    pub async fn resync(&self) -> Result<()> {
        if self.servers.is_shutdown_requested().await? {
            self.apply().await?;
        }
        Ok(())
    }

    async fn apply(&self) -> Result<()> {
        let Some(controller) = self.schedules.controller_for(&self.job_name).await else {
            tracing::debug!(job = %self.job_name, "Shutdown flag set but job is not running");
            return Ok(());
        };
        tracing::info!(job = %self.job_name, "Shutdown flag set, shutting down job");
        controller.shutdown();
        self.servers.on_shutdown().await
    }
}
