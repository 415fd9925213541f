//! Test harness for reactor integration tests.
//!
//! Provides recording collaborators that log every call in order, failure and
//! panic injection, and polling helpers for asserting on watcher effects.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use shard_sentinel::config::SentinelConfig;
use shard_sentinel::coordination::InMemoryCoordinator;
use shard_sentinel::election::LeaderElection;
use shard_sentinel::error::{Result, SentinelError};
use shard_sentinel::execution::ExecutionTracking;
use shard_sentinel::reactor::{Collaborators, JobOperationReactor, WatcherHandle};
use shard_sentinel::schedule::{JobRegistry, ScheduleController};
use shard_sentinel::server::ServerRegistry;
use shard_sentinel::sharding::{Sharding, ShardingItemSet};
use shard_sentinel::JobName;

/// One observed collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    HasLeader,
    RunElection,
    MarkOnline,
    IsPausedManually,
    ClearPausedFlag,
    IsShutdownRequested,
    OnShutdown,
    LocalShardingItems,
    ClearRunningInfo(ShardingItemSet),
    Pause,
    Resume,
    Shutdown,
}

impl Call {
    fn op(&self) -> &'static str {
        match self {
            Call::HasLeader => "has_leader",
            Call::RunElection => "run_election",
            Call::MarkOnline => "mark_online",
            Call::IsPausedManually => "is_paused_manually",
            Call::ClearPausedFlag => "clear_paused_flag",
            Call::IsShutdownRequested => "is_shutdown_requested",
            Call::OnShutdown => "on_shutdown",
            Call::LocalShardingItems => "local_sharding_items",
            Call::ClearRunningInfo(_) => "clear_running_info",
            Call::Pause => "pause",
            Call::Resume => "resume",
            Call::Shutdown => "shutdown",
        }
    }

    /// Calls that change state somewhere, as opposed to reads.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Call::HasLeader
                | Call::IsPausedManually
                | Call::IsShutdownRequested
                | Call::LocalShardingItems
        )
    }
}

/// Shared, ordered record of calls across all recording collaborators.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// Calls excluding pure reads.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Stand-in for election, server registry, sharding and execution tracking.
pub struct FakeCluster {
    log: CallLog,
    has_leader: AtomicBool,
    paused_manually: AtomicBool,
    shutdown_requested: AtomicBool,
    shards: Mutex<ShardingItemSet>,
    failures: Mutex<HashMap<&'static str, SentinelError>>,
    panics: Mutex<Vec<&'static str>>,
}

impl FakeCluster {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            has_leader: AtomicBool::new(true),
            paused_manually: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
            shards: Mutex::new(ShardingItemSet::new()),
            failures: Mutex::new(HashMap::new()),
            panics: Mutex::new(Vec::new()),
        }
    }

    pub fn set_has_leader(&self, value: bool) {
        self.has_leader.store(value, Ordering::SeqCst);
    }

    pub fn set_paused_manually(&self, value: bool) {
        self.paused_manually.store(value, Ordering::SeqCst);
    }

    pub fn set_shutdown_requested(&self, value: bool) {
        self.shutdown_requested.store(value, Ordering::SeqCst);
    }

    pub fn set_shards(&self, items: impl IntoIterator<Item = u32>) {
        *self.shards.lock().unwrap() = items.into_iter().collect();
    }

    /// Make every call to `op` fail with `error` until cleared.
    pub fn fail(&self, op: &'static str, error: SentinelError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
        self.panics.lock().unwrap().clear();
    }

    /// Make the next call to `op` panic.
    pub fn panic_on(&self, op: &'static str) {
        self.panics.lock().unwrap().push(op);
    }

    fn call(&self, call: Call) -> Result<()> {
        let op = call.op();
        self.log.record(call);
        let should_panic = {
            let mut panics = self.panics.lock().unwrap();
            match panics.iter().position(|p| *p == op) {
                Some(idx) => {
                    panics.remove(idx);
                    true
                }
                None => false,
            }
        };
        if should_panic {
            panic!("injected panic in {}", op);
        }
        match self.failures.lock().unwrap().get(op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LeaderElection for FakeCluster {
    async fn has_leader(&self) -> Result<bool> {
        self.call(Call::HasLeader)?;
        Ok(self.has_leader.load(Ordering::SeqCst))
    }

    async fn run_election(&self) -> Result<()> {
        self.call(Call::RunElection)?;
        self.has_leader.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ServerRegistry for FakeCluster {
    async fn mark_online(&self) -> Result<()> {
        self.call(Call::MarkOnline)
    }

    async fn is_paused_manually(&self) -> Result<bool> {
        self.call(Call::IsPausedManually)?;
        Ok(self.paused_manually.load(Ordering::SeqCst))
    }

    async fn clear_paused_flag(&self) -> Result<()> {
        self.call(Call::ClearPausedFlag)
    }

    async fn is_shutdown_requested(&self) -> Result<bool> {
        self.call(Call::IsShutdownRequested)?;
        Ok(self.shutdown_requested.load(Ordering::SeqCst))
    }

    async fn on_shutdown(&self) -> Result<()> {
        self.call(Call::OnShutdown)
    }
}

#[async_trait]
impl Sharding for FakeCluster {
    async fn local_sharding_items(&self) -> Result<ShardingItemSet> {
        self.call(Call::LocalShardingItems)?;
        Ok(self.shards.lock().unwrap().clone())
    }
}

#[async_trait]
impl ExecutionTracking for FakeCluster {
    async fn clear_running_info(&self, items: &ShardingItemSet) -> Result<()> {
        self.call(Call::ClearRunningInfo(items.clone()))
    }
}

/// Schedule controller that only records calls.
pub struct RecordingController {
    log: CallLog,
}

impl RecordingController {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl ScheduleController for RecordingController {
    fn pause(&self) {
        self.log.record(Call::Pause);
    }

    fn resume(&self) {
        self.log.record(Call::Resume);
    }

    fn shutdown(&self) {
        self.log.record(Call::Shutdown);
    }
}

pub fn collaborators(fake: &Arc<FakeCluster>, schedules: &Arc<JobRegistry>) -> Collaborators {
    Collaborators {
        election: fake.clone(),
        servers: fake.clone(),
        sharding: fake.clone(),
        execution: fake.clone(),
        schedules: schedules.clone(),
    }
}

/// A started reactor over an in-memory coordinator and recording collaborators.
pub struct ReactorFixture {
    pub config: SentinelConfig,
    pub coordinator: Arc<InMemoryCoordinator>,
    pub fake: Arc<FakeCluster>,
    pub schedules: Arc<JobRegistry>,
    pub log: CallLog,
    pub watchers: WatcherHandle,
}

impl ReactorFixture {
    /// Start a reactor for `job` on `host`. The job's controller is
    /// registered only when `with_controller` is set.
    pub async fn start(job: &str, host: &str, with_controller: bool) -> Self {
        let config = SentinelConfig::new(job, host);
        let coordinator = Arc::new(InMemoryCoordinator::new(config.event_buffer));
        let log = CallLog::default();
        let fake = Arc::new(FakeCluster::new(log.clone()));
        let schedules = Arc::new(JobRegistry::new());
        if with_controller {
            schedules
                .insert(
                    JobName::from(job),
                    Arc::new(RecordingController::new(log.clone())),
                )
                .await;
        }

        let reactor = JobOperationReactor::new(
            &config,
            coordinator.clone(),
            collaborators(&fake, &schedules),
        )
        .expect("valid test configuration");
        let watchers = reactor.start();

        Self {
            config,
            coordinator,
            fake,
            schedules,
            log,
            watchers,
        }
    }

    /// Wait until at least `n` calls have been recorded.
    pub async fn wait_for_calls(&self, n: usize) -> bool {
        wait_for(
            || async { self.log.calls().len() >= n },
            Duration::from_secs(2),
            Duration::from_millis(10),
        )
        .await
    }
}

/// Wait for a condition to become true with timeout
pub async fn wait_for<F, Fut>(
    condition: F,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout_duration {
        if condition().await {
            return true;
        }
        tokio::time::sleep(poll_interval).await;
    }
    false
}

/// Assert a condition eventually becomes true
pub async fn assert_eventually<F, Fut>(condition: F, timeout_duration: Duration, message: &str)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let result = wait_for(condition, timeout_duration, Duration::from_millis(10)).await;
    assert!(result, "{}", message);
}

/// Give watchers time to deliver anything still in flight.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
