use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::coordination::event::{ConnectionState, TreeEvent};
use crate::error::Result;

/// Read/write and watch primitives of a ZooKeeper-like coordination service.
///
/// Paths are absolute (`/job/servers/h1/status`). Parent nodes are implicit:
/// writing a node never requires its ancestors to exist.
#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Data stored at `path`, or `None` if the node does not exist.
    async fn get(&self, path: &str) -> Result<Option<String>>;

    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create or overwrite a node that outlives the session.
    async fn persist(&self, path: &str, value: &str) -> Result<()>;

    /// Create or overwrite a node owned by the current session.
    async fn persist_ephemeral(&self, path: &str, value: &str) -> Result<()>;

    /// Create an ephemeral node only if it does not exist yet.
    /// Returns `true` if this call created it.
    async fn create_ephemeral_if_absent(&self, path: &str, value: &str) -> Result<bool>;

    /// Remove a node. Removing a missing node is not an error.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Stream of session state transitions.
    fn subscribe_connection_state(&self) -> broadcast::Receiver<ConnectionState>;

    /// Stream of every node change in the tree.
    fn subscribe_tree(&self) -> broadcast::Receiver<TreeEvent>;
}
