use crate::job::JobName;

/// Builds absolute coordination paths inside one job's subtree.
///
/// Every job owns `/{job}`; the nodes below it are addressed relative to
/// that root, e.g. `servers/h1/paused` becomes `/{job}/servers/h1/paused`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNodePath {
    root: String,
}

impl JobNodePath {
    pub fn new(job_name: &JobName) -> Self {
        Self {
            root: format!("/{}", job_name),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn full_path(&self, node: &str) -> String {
        format!("{}/{}", self.root, node)
    }

    /// Whether `path` lies strictly inside this job's subtree.
    pub fn contains(&self, path: &str) -> bool {
        self.relative(path).is_some()
    }

    /// Strip the job root from `path`, if `path` is inside the subtree.
    pub fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }
}
