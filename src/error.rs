use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SentinelError {
    #[error("Connection to coordination service lost")]
    ConnectionLoss,

    #[error("Coordination request timed out: {0}")]
    Timeout(String),

    #[error("Coordination error: {0}")]
    Coordination(String),

    #[error("Malformed coordination path: {0}")]
    InvalidPath(String),

    #[error("Malformed sharding data at {path}: {value:?}")]
    InvalidShardingData { path: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SentinelError {
    /// Transient failures are expected to heal on their own; the next
    /// delivered event re-drives reconciliation.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SentinelError::ConnectionLoss | SentinelError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SentinelError>;
