//! Lifecycle reactor for one job on the local host.
//!
//! [`JobOperationReactor::start`] registers three watchers on the
//! coordination service:
//!
//! - **Connection state** ([`ConnectionStateHandler`]): pauses the job when
//!   the session is lost; on reconnect re-runs election if needed, marks the
//!   host online, clears stale running markers and resumes unless an
//!   operator paused the job.
//! - **Pause flag** ([`PausedFlagHandler`]): `servers/{host}/paused`.
//! - **Shutdown flag** ([`ShutdownFlagHandler`]): `servers/{host}/shutdown`.
//!
//! The handlers hold no state and take no locks. Events may be delivered
//! concurrently or out of order; every downstream operation is idempotent,
//! so redundant deliveries converge on the same end state.
//!
//! Each event is handled in its own task that the watcher awaits. Errors and
//! panics are logged and the watcher moves on to the next event, so one bad
//! delivery never silences the others.

pub mod connection;
pub mod flags;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SentinelConfig;
use crate::coordination::{CoordinationClient, TreeEvent};
use crate::election::{LeaderElection, LeaderElectionService};
use crate::error::Result;
use crate::execution::{ExecutionService, ExecutionTracking};
use crate::job::JobName;
use crate::path::JobNodePath;
use crate::schedule::JobRegistry;
use crate::server::{ServerNode, ServerRegistry, ServerService};
use crate::sharding::{Sharding, ShardingService};

pub use connection::ConnectionStateHandler;
pub use flags::{PausedFlagHandler, ShutdownFlagHandler};

/// Subsystems the reactor drives.
#[derive(Clone)]
pub struct Collaborators {
    pub election: Arc<dyn LeaderElection>,
    pub servers: Arc<dyn ServerRegistry>,
    pub sharding: Arc<dyn Sharding>,
    pub execution: Arc<dyn ExecutionTracking>,
    pub schedules: Arc<JobRegistry>,
}

impl Collaborators {
    /// Coordination-backed services for the configured job and host.
    pub fn from_coordination(
        config: &SentinelConfig,
        client: Arc<dyn CoordinationClient>,
        schedules: Arc<JobRegistry>,
    ) -> Self {
        let job = &config.job_name;
        Self {
            election: Arc::new(LeaderElectionService::new(client.clone(), job, &config.host)),
            servers: Arc::new(ServerService::new(client.clone(), job, &config.host)),
            sharding: Arc::new(ShardingService::new(client.clone(), job, &config.host)),
            execution: Arc::new(ExecutionService::new(client, job, config.monitor_execution)),
            schedules,
        }
    }
}

pub struct JobOperationReactor {
    job_name: JobName,
    job_path: JobNodePath,
    client: Arc<dyn CoordinationClient>,
    connection: Arc<ConnectionStateHandler>,
    paused: Arc<PausedFlagHandler>,
    shutdown: Arc<ShutdownFlagHandler>,
}

impl JobOperationReactor {
    pub fn new(
        config: &SentinelConfig,
        client: Arc<dyn CoordinationClient>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;
        let job_name = config.job_name.clone();
        let server_node = ServerNode::new(&job_name, config.host.clone());
        let Collaborators {
            election,
            servers,
            sharding,
            execution,
            schedules,
        } = collaborators;

        Ok(Self {
            job_path: JobNodePath::new(&job_name),
            client,
            connection: Arc::new(ConnectionStateHandler::new(
                job_name.clone(),
                election,
                servers.clone(),
                sharding,
                execution,
                schedules.clone(),
            )),
            paused: Arc::new(PausedFlagHandler::new(
                job_name.clone(),
                server_node.clone(),
                servers.clone(),
                schedules.clone(),
            )),
            shutdown: Arc::new(ShutdownFlagHandler::new(
                job_name.clone(),
                server_node,
                servers,
                schedules,
            )),
            job_name,
        })
    }

    /// Reactor wired to the default coordination-backed services.
    pub fn with_coordination(
        config: &SentinelConfig,
        client: Arc<dyn CoordinationClient>,
        schedules: Arc<JobRegistry>,
    ) -> Result<Self> {
        let collaborators = Collaborators::from_coordination(config, client.clone(), schedules);
        Self::new(config, client, collaborators)
    }

    /// Register the connection-state, pause-flag and shutdown-flag watchers.
    ///
    /// Subscriptions are taken before this returns, so every event emitted
    /// afterwards is delivered. Must be called from within a tokio runtime.
    pub fn start(&self) -> WatcherHandle {
        let cancel = CancellationToken::new();

        let connection = self.connection.clone();
        let connection_watcher = spawn_watcher(
            "connection_state",
            self.job_name.clone(),
            self.client.subscribe_connection_state(),
            cancel.clone(),
            |_| true,
            move |state| {
                let handler = connection.clone();
                async move { handler.handle(state).await }
            },
            // Connection state cannot be re-read; the next transition reconciles.
            || std::future::ready(Result::<()>::Ok(())),
        );

        let paused = self.paused.clone();
        let paused_resync = self.paused.clone();
        let job_path = self.job_path.clone();
        let paused_watcher = spawn_watcher(
            "paused_flag",
            self.job_name.clone(),
            self.client.subscribe_tree(),
            cancel.clone(),
            move |event: &TreeEvent| job_path.contains(&event.path),
            move |event: TreeEvent| {
                let handler = paused.clone();
                async move { handler.handle(&event).await }
            },
            move || {
                let handler = paused_resync.clone();
                async move { handler.resync().await }
            },
        );

        let shutdown = self.shutdown.clone();
        let shutdown_resync = self.shutdown.clone();
        let job_path = self.job_path.clone();
        let shutdown_watcher = spawn_watcher(
            "shutdown_flag",
            self.job_name.clone(),
            self.client.subscribe_tree(),
            cancel.clone(),
            move |event: &TreeEvent| job_path.contains(&event.path),
            move |event: TreeEvent| {
                let handler = shutdown.clone();
                async move { handler.handle(&event).await }
            },
            move || {
                let handler = shutdown_resync.clone();
                async move { handler.resync().await }
            },
        );

        tracing::info!(job = %self.job_name, "Job operation watchers registered");
        WatcherHandle {
            job_name: self.job_name.clone(),
            cancel,
            tasks: vec![connection_watcher, paused_watcher, shutdown_watcher],
        }
    }
}

/// Running watchers of a started reactor. Dropping the handle cancels them
/// without waiting.
pub struct WatcherHandle {
    job_name: JobName,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn watcher_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|task| task.is_finished())
    }

    /// Stop the watchers. An event already being handled runs to completion.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(job = %self.job_name, error = %e, "Watcher exited abnormally");
            }
        }
        tracing::info!(job = %self.job_name, "Job operation watchers stopped");
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Run `handle` for every accepted event until cancelled. When the receiver
/// lags, the dropped events are unknown, so `resync` re-reads the watched
/// state instead.
fn spawn_watcher<T, A, F, Fut, R, RFut>(
    watcher: &'static str,
    job_name: JobName,
    mut rx: broadcast::Receiver<T>,
    cancel: CancellationToken,
    accept: A,
    handle: F,
    resync: R,
) -> JoinHandle<()>
where
    T: Clone + Send + 'static,
    A: Fn(&T) -> bool + Send + 'static,
    F: Fn(T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
    R: Fn() -> RFut + Send + 'static,
    RFut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(job = %job_name, watcher, skipped, "Watcher lagged, resyncing");
                        dispatch(watcher, &job_name, resync()).await;
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!(job = %job_name, watcher, "Event stream closed");
                        break;
                    }
                },
            };
            if accept(&event) {
                dispatch(watcher, &job_name, handle(event)).await;
            }
        }
    })
}

async fn dispatch<Fut>(watcher: &'static str, job_name: &JobName, handler: Fut)
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    match tokio::spawn(handler).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.is_transient() => {
            tracing::warn!(
                job = %job_name,
                watcher,
                error = %e,
                "Handler interrupted by coordination failure, awaiting next event"
            );
        }
        Ok(Err(e)) => {
            tracing::error!(
                job = %job_name,
                watcher,
                error = %e,
                "Handler failed, remaining steps skipped"
            );
        }
        Err(e) if e.is_panic() => {
            tracing::error!(job = %job_name, watcher, error = %e, "Handler panicked");
        }
        Err(e) => {
            tracing::warn!(job = %job_name, watcher, error = %e, "Handler task cancelled");
        }
    }
}
