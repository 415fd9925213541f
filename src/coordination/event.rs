use serde::{Deserialize, Serialize};

/// Connection lifecycle of the coordination client's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// First successful connection of the session.
    Connected,
    /// Connection interrupted; the session may still be alive.
    Suspended,
    /// Session expired. Ephemeral nodes owned by it are gone.
    Lost,
    /// Connection re-established after a suspension or loss.
    Reconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Suspended => write!(f, "suspended"),
            ConnectionState::Lost => write!(f, "lost"),
            ConnectionState::Reconnected => write!(f, "reconnected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeEventKind {
    NodeAdded,
    NodeUpdated,
    NodeRemoved,
}

impl std::fmt::Display for TreeEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeEventKind::NodeAdded => write!(f, "node_added"),
            TreeEventKind::NodeUpdated => write!(f, "node_updated"),
            TreeEventKind::NodeRemoved => write!(f, "node_removed"),
        }
    }
}

/// A change to a single node of the coordination tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEvent {
    pub kind: TreeEventKind,
    pub path: String,
    /// Node data after the change; `None` for removals.
    pub data: Option<String>,
}

impl TreeEvent {
    pub fn added(path: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: TreeEventKind::NodeAdded,
            path: path.into(),
            data: Some(data.into()),
        }
    }

    pub fn updated(path: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: TreeEventKind::NodeUpdated,
            path: path.into(),
            data: Some(data.into()),
        }
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Self {
            kind: TreeEventKind::NodeRemoved,
            path: path.into(),
            data: None,
        }
    }
}
