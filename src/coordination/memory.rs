use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::coordination::client::CoordinationClient;
use crate::coordination::event::{ConnectionState, TreeEvent};
use crate::error::{Result, SentinelError};

#[derive(Debug, Clone)]
struct Znode {
    value: String,
    /// Session that owns an ephemeral node; `None` for persistent nodes.
    owner: Option<Uuid>,
}

#[derive(Debug)]
struct Store {
    nodes: BTreeMap<String, Znode>,
    session_id: Uuid,
    connected: bool,
    expired: bool,
}

/// Single-session coordination service held in process memory.
///
/// Used by tests and the simulation binary. Watches are real: every mutation
/// is broadcast to tree subscribers in the order it was applied, and the
/// fault-injection methods ([`suspend`](Self::suspend),
/// [`lose_session`](Self::lose_session), [`reconnect`](Self::reconnect))
/// broadcast the matching [`ConnectionState`]. While disconnected, every
/// store operation fails with [`SentinelError::ConnectionLoss`].
pub struct InMemoryCoordinator {
    store: Mutex<Store>,
    state_tx: broadcast::Sender<ConnectionState>,
    tree_tx: broadcast::Sender<TreeEvent>,
}

impl InMemoryCoordinator {
    /// `event_buffer` is the per-subscriber backlog; zero is raised to one.
    pub fn new(event_buffer: usize) -> Self {
        let event_buffer = event_buffer.max(1);
        let (state_tx, _) = broadcast::channel(event_buffer);
        let (tree_tx, _) = broadcast::channel(event_buffer);
        Self {
            store: Mutex::new(Store {
                nodes: BTreeMap::new(),
                session_id: Uuid::new_v4(),
                connected: true,
                expired: false,
            }),
            state_tx,
            tree_tx,
        }
    }

    pub async fn session_id(&self) -> Uuid {
        self.store.lock().await.session_id
    }

    pub async fn is_connected(&self) -> bool {
        self.store.lock().await.connected
    }

    /// Announce the initial connection of the session.
    pub async fn connect(&self) {
        let mut store = self.store.lock().await;
        store.connected = true;
        self.emit_state(ConnectionState::Connected);
    }

    /// Interrupt the connection while keeping the session alive.
    pub async fn suspend(&self) {
        let mut store = self.store.lock().await;
        store.connected = false;
        self.emit_state(ConnectionState::Suspended);
    }

    /// Expire the session: its ephemeral nodes are deleted.
    pub async fn lose_session(&self) {
        let mut store = self.store.lock().await;
        store.connected = false;
        store.expired = true;
        let session_id = store.session_id;
        let expired: Vec<String> = store
            .nodes
            .iter()
            .filter(|(_, node)| node.owner == Some(session_id))
            .map(|(path, _)| path.clone())
            .collect();
        for path in expired {
            store.nodes.remove(&path);
            self.emit_tree(TreeEvent::removed(path));
        }
        tracing::info!(session_id = %session_id, "Coordination session lost");
        self.emit_state(ConnectionState::Lost);
    }

    /// Re-establish the connection. A session that was lost is replaced.
    pub async fn reconnect(&self) {
        let mut store = self.store.lock().await;
        if store.expired {
            store.session_id = Uuid::new_v4();
            store.expired = false;
        }
        store.connected = true;
        tracing::info!(session_id = %store.session_id, "Coordination session reconnected");
        self.emit_state(ConnectionState::Reconnected);
    }

    /// All nodes and their data, ordered by path.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.store
            .lock()
            .await
            .nodes
            .iter()
            .map(|(path, node)| (path.clone(), node.value.clone()))
            .collect()
    }

    fn emit_state(&self, state: ConnectionState) {
        // No subscribers is fine: nobody is watching yet.
        let _ = self.state_tx.send(state);
    }

    fn emit_tree(&self, event: TreeEvent) {
        let _ = self.tree_tx.send(event);
    }

    async fn write(&self, path: &str, value: &str, ephemeral: bool) -> Result<()> {
        validate_path(path)?;
        let mut store = self.store.lock().await;
        if !store.connected {
            return Err(SentinelError::ConnectionLoss);
        }
        let owner = ephemeral.then_some(store.session_id);
        let previous = store.nodes.insert(
            path.to_string(),
            Znode {
                value: value.to_string(),
                owner,
            },
        );
        let event = match previous {
            Some(_) => TreeEvent::updated(path, value),
            None => TreeEvent::added(path, value),
        };
        self.emit_tree(event);
        Ok(())
    }
}

#[async_trait]
impl CoordinationClient for InMemoryCoordinator {
    async fn get(&self, path: &str) -> Result<Option<String>> {
        validate_path(path)?;
        let store = self.store.lock().await;
        if !store.connected {
            return Err(SentinelError::ConnectionLoss);
        }
        Ok(store.nodes.get(path).map(|node| node.value.clone()))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        let store = self.store.lock().await;
        if !store.connected {
            return Err(SentinelError::ConnectionLoss);
        }
        Ok(store.nodes.contains_key(path))
    }

    async fn persist(&self, path: &str, value: &str) -> Result<()> {
        self.write(path, value, false).await
    }

    async fn persist_ephemeral(&self, path: &str, value: &str) -> Result<()> {
        self.write(path, value, true).await
    }

    async fn create_ephemeral_if_absent(&self, path: &str, value: &str) -> Result<bool> {
        validate_path(path)?;
        let mut store = self.store.lock().await;
        if !store.connected {
            return Err(SentinelError::ConnectionLoss);
        }
        if store.nodes.contains_key(path) {
            return Ok(false);
        }
        let owner = Some(store.session_id);
        store.nodes.insert(
            path.to_string(),
            Znode {
                value: value.to_string(),
                owner,
            },
        );
        self.emit_tree(TreeEvent::added(path, value));
        Ok(true)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        let mut store = self.store.lock().await;
        if !store.connected {
            return Err(SentinelError::ConnectionLoss);
        }
        if store.nodes.remove(path).is_some() {
            self.emit_tree(TreeEvent::removed(path));
        }
        Ok(())
    }

    fn subscribe_connection_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn subscribe_tree(&self) -> broadcast::Receiver<TreeEvent> {
        self.tree_tx.subscribe()
    }
}

fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') || path.len() < 2 || path.ends_with('/') || path.contains("//") {
        return Err(SentinelError::InvalidPath(path.to_string()));
    }
    Ok(())
}
