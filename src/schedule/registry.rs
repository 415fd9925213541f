use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::job::JobName;
use crate::schedule::controller::ScheduleController;

/// Process-wide lookup of live schedulers, keyed by job name.
///
/// Entries are inserted when a job starts and removed when it is torn down;
/// the reactor only reads. A missing entry means the job has not started yet
/// or has already terminated.
#[derive(Default)]
pub struct JobRegistry {
    controllers: RwLock<HashMap<JobName, Arc<dyn ScheduleController>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller, returning the one it replaced.
    pub async fn insert(
        &self,
        job_name: JobName,
        controller: Arc<dyn ScheduleController>,
    ) -> Option<Arc<dyn ScheduleController>> {
        tracing::debug!(job = %job_name, "Schedule controller registered");
        self.controllers.write().await.insert(job_name, controller)
    }

    pub async fn remove(&self, job_name: &JobName) -> Option<Arc<dyn ScheduleController>> {
        let removed = self.controllers.write().await.remove(job_name);
        if removed.is_some() {
            tracing::debug!(job = %job_name, "Schedule controller removed");
        }
        removed
    }

    pub async fn controller_for(&self, job_name: &JobName) -> Option<Arc<dyn ScheduleController>> {
        self.controllers.read().await.get(job_name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.controllers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.controllers.read().await.is_empty()
    }
}
