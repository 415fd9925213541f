use crate::error::{Result, SentinelError};
use crate::job::JobName;

const DEFAULT_EVENT_BUFFER: usize = 256;

/// Configuration for one job's lifecycle reactor on the local host.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Job whose coordination subtree is watched.
    pub job_name: JobName,
    /// Identity of the local host inside `servers/{host}`. Must be unique
    /// across every host running the job.
    pub host: String,
    /// Track per-shard running markers under `execution/{item}/running`.
    /// When false, clearing running info is a no-op.
    pub monitor_execution: bool,
    /// Capacity of the in-memory coordinator's event channels.
    pub event_buffer: usize,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            job_name: JobName::new("default-job"),
            host: "127.0.0.1".to_string(),
            monitor_execution: true,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SentinelConfig {
    pub fn new(job_name: impl Into<JobName>, host: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_monitor_execution(mut self, enabled: bool) -> Self {
        self.monitor_execution = enabled;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Reject values that would produce ambiguous coordination paths.
    pub fn validate(&self) -> Result<()> {
        validate_segment("job name", self.job_name.as_str())?;
        validate_segment("host", &self.host)?;
        if self.event_buffer == 0 {
            return Err(SentinelError::InvalidConfig(
                "event buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_segment(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SentinelError::InvalidConfig(format!("{} is empty", what)));
    }
    if value.contains('/') {
        return Err(SentinelError::InvalidConfig(format!(
            "{} {:?} must not contain '/'",
            what, value
        )));
    }
    Ok(())
}
