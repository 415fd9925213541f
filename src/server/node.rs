use crate::job::JobName;
use crate::path::JobNodePath;

pub const READY: &str = "READY";

/// Paths of the local host's nodes under `/{job}/servers/{host}`.
///
/// Flag matching is exact: a path only counts as the local flag if it is
/// byte-for-byte the local host's flag path, so `servers/h1/paused` never
/// matches for host `h10` and never matches under another job.
#[derive(Debug, Clone)]
pub struct ServerNode {
    job_path: JobNodePath,
    host: String,
}

impl ServerNode {
    pub fn new(job_name: &JobName, host: impl Into<String>) -> Self {
        Self {
            job_path: JobNodePath::new(job_name),
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn status_node(&self) -> String {
        format!("servers/{}/status", self.host)
    }

    pub fn paused_node(&self) -> String {
        format!("servers/{}/paused", self.host)
    }

    pub fn shutdown_node(&self) -> String {
        format!("servers/{}/shutdown", self.host)
    }

    pub fn sharding_node(&self) -> String {
        format!("servers/{}/sharding", self.host)
    }

    pub fn paused_path(&self) -> String {
        self.job_path.full_path(&self.paused_node())
    }

    pub fn shutdown_path(&self) -> String {
        self.job_path.full_path(&self.shutdown_node())
    }

    pub fn is_local_paused_path(&self, path: &str) -> bool {
        path == self.paused_path()
    }

    pub fn is_local_shutdown_path(&self, path: &str) -> bool {
        path == self.shutdown_path()
    }
}
