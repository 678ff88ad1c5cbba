use serde::{Deserialize, Serialize};

/// Unique identifier for a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContainerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Container state as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Stopped,
    Paused,
    Restarting,
    Dead,
    Created,
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Inventory entry returned by the runtime gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRef {
    pub id: ContainerId,
    /// Display name, possibly with the runtime's leading `/`
    pub name: String,
    pub state: ContainerState,
    /// Human-readable status, e.g. "Up 3 minutes"
    pub status: String,
}

impl ContainerRef {
    pub fn new(id: impl Into<ContainerId>, name: impl Into<String>, state: ContainerState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state,
            status: String::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Name without the leading `/`
    pub fn display_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }
}

/// CPU reading for one container, taken during a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSample {
    pub id: ContainerId,
    pub name: String,
    pub cpu_fraction: f64,
}

impl ContainerSample {
    pub fn new(container: &ContainerRef, cpu_fraction: f64) -> Self {
        Self {
            id: container.id.clone(),
            name: container.display_name().to_string(),
            cpu_fraction,
        }
    }
}
