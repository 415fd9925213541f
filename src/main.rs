use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use shard_sentinel::config::SentinelConfig;
use shard_sentinel::coordination::{CoordinationClient, InMemoryCoordinator};
use shard_sentinel::election::LeaderElectionService;
use shard_sentinel::execution::ExecutionService;
use shard_sentinel::reactor::JobOperationReactor;
use shard_sentinel::schedule::{JobRegistry, JobScheduleController};
use shard_sentinel::server::{ServerNode, ServerRegistry, ServerService};
use shard_sentinel::sharding::{format_items, ShardingItemSet, ShardingService};

#[derive(Parser, Debug)]
#[command(name = "shard-sentinel")]
#[command(version)]
#[command(about = "Replay coordination-service failure scenarios against a job reactor")]
#[command(propagate_version = true)]
struct Args {
    #[command(flatten)]
    job: JobArgs,

    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Job name
    #[arg(long, default_value = "J1")]
    job_name: String,

    /// Identity of the local host
    #[arg(long, default_value = "h1")]
    host: String,

    /// Shard items owned by the local host (comma-separated)
    #[arg(long, default_value = "0,1,2")]
    shards: String,

    /// Do not track per-shard running markers
    #[arg(long)]
    no_monitor_execution: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum Scenario {
    /// Lose the coordination session, then reconnect
    Partition {
        /// Set the operator pause flag while disconnected
        #[arg(long)]
        manual_pause: bool,
    },
    /// Set, then clear, the operator pause flag
    Pause,
    /// Set the operator shutdown flag
    Shutdown,
}

// =============================================================================
// Report
// =============================================================================

#[derive(Serialize)]
struct StepReport {
    step: String,
    schedule_state: String,
    leader: Option<String>,
    online: Option<bool>,
    paused_flag: Option<bool>,
    running_items: Option<String>,
}

#[derive(Serialize)]
struct ScenarioReport {
    job_name: String,
    host: String,
    steps: Vec<StepReport>,
}

struct Simulation {
    coordinator: Arc<InMemoryCoordinator>,
    controller: Arc<JobScheduleController>,
    election: LeaderElectionService,
    servers: ServerService,
    execution: ExecutionService,
    shards: ShardingItemSet,
    steps: Vec<StepReport>,
}

impl Simulation {
    /// Observe the cluster after the watchers had time to react.
    async fn record(&mut self, step: &str) {
        tokio::time::sleep(Duration::from_millis(50)).await;

        let connected = self.coordinator.is_connected().await;
        let mut running = ShardingItemSet::new();
        if connected {
            for item in &self.shards {
                if self.execution.is_running(*item).await.unwrap_or(false) {
                    running.insert(*item);
                }
            }
        }

        self.steps.push(StepReport {
            step: step.to_string(),
            schedule_state: self.controller.state().to_string(),
            leader: self.election.leader_host().await.ok().flatten(),
            online: self.servers.is_online().await.ok(),
            paused_flag: self.servers.is_paused_manually().await.ok(),
            running_items: connected.then(|| format_items(&running)),
        });
    }
}

fn parse_shards(shards: &str) -> Result<ShardingItemSet, Box<dyn std::error::Error>> {
    let mut items = ShardingItemSet::new();
    for item in shards.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let parsed = item
            .parse::<u32>()
            .map_err(|e| format!("invalid shard item {:?}: {}", item, e))?;
        items.insert(parsed);
    }
    Ok(items)
}

fn print_table(report: &ScenarioReport) {
    println!("job {} on host {}", report.job_name, report.host);
    println!(
        "{:<28} {:<10} {:<8} {:<7} {:<7} {}",
        "STEP", "SCHEDULE", "LEADER", "ONLINE", "PAUSED", "RUNNING"
    );
    for step in &report.steps {
        println!(
            "{:<28} {:<10} {:<8} {:<7} {:<7} {}",
            step.step,
            step.schedule_state,
            step.leader.as_deref().unwrap_or("-"),
            step.online.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string()),
            step.paused_flag.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string()),
            step.running_items.as_deref().unwrap_or("?"),
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = SentinelConfig::new(args.job.job_name.as_str(), args.job.host.as_str())
        .with_monitor_execution(!args.job.no_monitor_execution);
    config.validate()?;
    let shards = parse_shards(&args.job.shards)?;

    let coordinator = Arc::new(InMemoryCoordinator::new(config.event_buffer));
    let schedules = Arc::new(JobRegistry::new());
    let controller = Arc::new(JobScheduleController::new(config.job_name.clone()));

    let reactor =
        JobOperationReactor::with_coordination(&config, coordinator.clone(), schedules.clone())?;
    let watchers = reactor.start();
    coordinator.connect().await;

    let job = &config.job_name;
    let mut sim = Simulation {
        coordinator: coordinator.clone(),
        controller: controller.clone(),
        election: LeaderElectionService::new(coordinator.clone(), job, &config.host),
        servers: ServerService::new(coordinator.clone(), job, &config.host),
        execution: ExecutionService::new(coordinator.clone(), job, config.monitor_execution),
        shards,
        steps: Vec::new(),
    };

    // Job start-up, normally performed by the scheduling layer.
    schedules.insert(job.clone(), controller.clone()).await;
    ShardingService::new(coordinator.clone(), job, &config.host)
        .assign(&sim.shards)
        .await?;
    sim.servers.mark_online().await?;
    sim.execution.register_running(&sim.shards).await?;
    sim.record("started").await;

    match args.scenario {
        Scenario::Partition { manual_pause } => {
            coordinator.suspend().await;
            sim.record("suspended").await;
            coordinator.lose_session().await;
            sim.record("session lost").await;
            coordinator.reconnect().await;
            if manual_pause {
                sim.servers.pause_manually().await?;
                coordinator.suspend().await;
                coordinator.reconnect().await;
            }
            sim.record("reconnected").await;
        }
        Scenario::Pause => {
            sim.servers.pause_manually().await?;
            sim.record("pause flag set").await;
            coordinator
                .remove(&ServerNode::new(job, config.host.as_str()).paused_path())
                .await?;
            sim.record("pause flag removed").await;
        }
        Scenario::Shutdown => {
            sim.servers.request_shutdown().await?;
            sim.record("shutdown flag set").await;
        }
    }

    watchers.shutdown().await;

    let report = ScenarioReport {
        job_name: job.to_string(),
        host: config.host.clone(),
        steps: sim.steps,
    };
    match args.job.output {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
