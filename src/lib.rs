//! Connection-loss and operator-flag reactor for a sharded job scheduler.
//!
//! A [`JobOperationReactor`](reactor::JobOperationReactor) watches a job's
//! coordination subtree and keeps the local scheduler's run/pause/shutdown
//! state consistent with the cluster: it pauses on session loss, reconciles
//! leadership, membership and running markers on reconnect, and applies the
//! per-host pause and shutdown flags set by operators.

pub mod config;
pub mod coordination;
pub mod election;
pub mod error;
pub mod execution;
pub mod job;
pub mod path;
pub mod reactor;
pub mod schedule;
pub mod server;
pub mod sharding;
pub mod storage;

pub use config::SentinelConfig;
pub use error::{Result, SentinelError};
pub use job::JobName;
pub use reactor::{Collaborators, JobOperationReactor, WatcherHandle};
