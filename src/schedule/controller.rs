use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::job::JobName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleState {
    Running,
    Paused,
    Shutdown,
}

impl std::fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleState::Running => write!(f, "running"),
            ScheduleState::Paused => write!(f, "paused"),
            ScheduleState::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// State of a local scheduler together with the time it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub state: ScheduleState,
    pub since: DateTime<Utc>,
}

/// Live handle on a job's local scheduler.
///
/// Every operation is idempotent: pausing a paused scheduler or resuming a
/// running one does nothing. Shutdown is terminal.
pub trait ScheduleController: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn shutdown(&self);
}

/// Default [`ScheduleController`]. Publishes each transition on a watch
/// channel so the execution layer can stop or restart triggering.
#[derive(Debug)]
pub struct JobScheduleController {
    job_name: JobName,
    status_tx: watch::Sender<ScheduleStatus>,
}

impl JobScheduleController {
    pub fn new(job_name: JobName) -> Self {
        let (status_tx, _) = watch::channel(ScheduleStatus {
            state: ScheduleState::Running,
            since: Utc::now(),
        });
        Self {
            job_name,
            status_tx,
        }
    }

    pub fn job_name(&self) -> &JobName {
        &self.job_name
    }

    pub fn state(&self) -> ScheduleState {
        self.status_tx.borrow().state
    }

    pub fn status(&self) -> ScheduleStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScheduleStatus> {
        self.status_tx.subscribe()
    }

    /// Apply a transition. Returns the state it replaced, or `None` if the
    /// request was a no-op.
    fn transition(&self, to: ScheduleState) -> Option<ScheduleState> {
        let mut previous = None;
        self.status_tx.send_if_modified(|status| {
            if status.state == to || status.state == ScheduleState::Shutdown {
                return false;
            }
            previous = Some(status.state);
            *status = ScheduleStatus {
                state: to,
                since: Utc::now(),
            };
            true
        });
        match previous {
            Some(from) => {
                tracing::info!(job = %self.job_name, from = %from, to = %to, "Schedule state changed");
            }
            None => {
                tracing::debug!(job = %self.job_name, requested = %to, "Schedule transition ignored");
            }
        }
        previous
    }
}

impl ScheduleController for JobScheduleController {
    fn pause(&self) {
        self.transition(ScheduleState::Paused);
    }

    fn resume(&self) {
        self.transition(ScheduleState::Running);
    }

    fn shutdown(&self) {
        self.transition(ScheduleState::Shutdown);
    }
}
