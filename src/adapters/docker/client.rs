use async_trait::async_trait;
use bollard::container::{CPUStats, ListContainersOptions, StatsOptions};
use bollard::Docker;
use futures::stream::StreamExt;

use crate::domain::{cpu_fraction, ContainerRef, ContainerState, CpuUsage, ServiceIdentity};
use crate::error::GatewayError;
use crate::ports::RuntimeGateway;

use super::ComposeScaler;

const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Daemon address taken from a `DOCKER_HOST` style value
#[derive(Debug, Clone, PartialEq, Eq)]
enum DockerEndpoint<'a> {
    LocalDefaults,
    Socket(&'a str),
    Http(&'a str),
}

impl<'a> DockerEndpoint<'a> {
    fn parse(docker_host: Option<&'a str>) -> Result<Self, GatewayError> {
        let Some(host) = docker_host else {
            return Ok(Self::LocalDefaults);
        };

        if host.starts_with("unix://") || host.starts_with("npipe://") || host.starts_with('/') {
            Ok(Self::Socket(host))
        } else if host.starts_with("tcp://") || host.starts_with("http://") {
            Ok(Self::Http(host))
        } else {
            Err(GatewayError::RuntimeUnavailable(format!(
                "unsupported DOCKER_HOST {:?}: expected unix://, npipe://, tcp:// or http://",
                host
            )))
        }
    }
}

/// Docker adapter using bollard for inventory and stats, compose for scaling
pub struct DockerAdapter {
    client: Docker,
    compose: ComposeScaler,
}

impl DockerAdapter {
    pub fn new(compose: ComposeScaler) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self { client, compose })
    }

    pub fn with_socket(
        socket_path: &str,
        compose: ComposeScaler,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = Docker::connect_with_socket(socket_path, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?;
        Ok(Self { client, compose })
    }

    pub fn with_http(addr: &str, compose: ComposeScaler) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = Docker::connect_with_http(addr, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?;
        Ok(Self { client, compose })
    }

    /// Connect according to a `DOCKER_HOST` style value, or local defaults when unset
    pub fn connect(
        docker_host: Option<&str>,
        compose: ComposeScaler,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        match DockerEndpoint::parse(docker_host)? {
            DockerEndpoint::LocalDefaults => Self::new(compose),
            DockerEndpoint::Socket(path) => Self::with_socket(path, compose),
            DockerEndpoint::Http(addr) => Self::with_http(addr, compose),
        }
    }

    /// Verify the daemon answers before the loop starts
    pub async fn ping(&self) -> Result<(), GatewayError> {
        self.client.ping().await.map(|_| ()).map_err(unavailable)
    }

    fn map_container_state(state: &Option<String>) -> ContainerState {
        match state.as_deref() {
            Some("running") => ContainerState::Running,
            Some("paused") => ContainerState::Paused,
            Some("restarting") => ContainerState::Restarting,
            Some("dead") => ContainerState::Dead,
            Some("created") => ContainerState::Created,
            _ => ContainerState::Stopped,
        }
    }

    fn parse_container_name(names: &Option<Vec<String>>) -> String {
        names
            .as_ref()
            .and_then(|n| n.first())
            .map(|s| s.trim_start_matches('/').to_string())
            .unwrap_or_default()
    }

    fn cpu_usage(stats: &CPUStats) -> CpuUsage {
        let mut usage = CpuUsage::new(stats.cpu_usage.total_usage, stats.system_cpu_usage.unwrap_or(0));
        if let Some(percpu) = &stats.cpu_usage.percpu_usage {
            usage = usage.with_percpu_entries(percpu.len());
        }
        if let Some(online) = stats.online_cpus {
            usage = usage.with_online_cpus(online);
        }
        usage
    }
}

fn unavailable(e: bollard::errors::Error) -> GatewayError {
    GatewayError::RuntimeUnavailable(e.to_string())
}

#[async_trait]
impl RuntimeGateway for DockerAdapter {
    async fn list_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRef>, GatewayError> {
        let options = Some(ListContainersOptions::<String> {
            all: include_stopped,
            ..Default::default()
        });

        let summaries = self.client.list_containers(options).await.map_err(unavailable)?;

        Ok(summaries
            .into_iter()
            .map(|summary| {
                ContainerRef::new(
                    summary.id.unwrap_or_default(),
                    Self::parse_container_name(&summary.names),
                    Self::map_container_state(&summary.state),
                )
                .with_status(summary.status.unwrap_or_default())
            })
            .collect())
    }

    async fn cpu_fraction(&self, container: &ContainerRef) -> Result<f64, GatewayError> {
        // one_shot must stay off, otherwise precpu_stats comes back empty
        let mut stream = self.client.stats(
            container.id.as_str(),
            Some(StatsOptions {
                stream: false,
                one_shot: false,
            }),
        );

        let stats = stream
            .next()
            .await
            .ok_or_else(|| {
                GatewayError::RuntimeUnavailable(format!("No stats available for {}", container.display_name()))
            })?
            .map_err(unavailable)?;

        Ok(cpu_fraction(
            &Self::cpu_usage(&stats.cpu_stats),
            &Self::cpu_usage(&stats.precpu_stats),
        ))
    }

    async fn apply_replica_count(&self, service: &ServiceIdentity, count: u32) -> Result<(), GatewayError> {
        self.compose.scale(service, count).await
    }
}
