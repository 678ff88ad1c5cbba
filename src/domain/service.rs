use std::fmt;

use serde::{Deserialize, Serialize};

/// The (project, service) pair that groups the containers of one scalable unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub project: String,
    pub service: String,
}

impl ServiceIdentity {
    pub fn new(project: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            service: service.into(),
        }
    }

    /// Name prefix shared by every container of this service (`{project}_{service}`)
    pub fn container_prefix(&self) -> String {
        format!("{}_{}", self.project, self.service)
    }

    /// Check whether a container display name belongs to this service.
    ///
    /// Docker reports names with a leading `/`, which is ignored here.
    pub fn matches(&self, display_name: &str) -> bool {
        display_name
            .trim_start_matches('/')
            .starts_with(&self.container_prefix())
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.service)
    }
}
