use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::domain::ServiceIdentity;
use crate::error::GatewayError;

/// Scales compose services by shelling out to `docker compose`
#[derive(Debug, Clone)]
pub struct ComposeScaler {
    program: String,
    project_dir: PathBuf,
}

impl ComposeScaler {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: "docker".to_string(),
            project_dir: project_dir.into(),
        }
    }

    /// Use a different executable in place of `docker`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn args(service: &ServiceIdentity, replicas: u32) -> Vec<String> {
        vec![
            "compose".to_string(),
            "-p".to_string(),
            service.project.clone(),
            "up".to_string(),
            "-d".to_string(),
            "--scale".to_string(),
            format!("{}={}", service.service, replicas),
        ]
    }

    /// Run `docker compose -p <project> up -d --scale <service>=<n>` and wait for it
    pub async fn scale(&self, service: &ServiceIdentity, replicas: u32) -> Result<(), GatewayError> {
        let args = Self::args(service, replicas);
        debug!(program = %self.program, ?args, dir = %self.project_dir.display(), "running compose scale");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.project_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| GatewayError::ScaleFailed(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::ScaleFailed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
