use async_trait::async_trait;

use crate::domain::{ContainerRef, ServiceIdentity};
use crate::error::GatewayError;

/// Port for the container runtime: inventory, CPU stats and scaling
#[async_trait]
pub trait RuntimeGateway: Send + Sync {
    /// List containers, optionally including stopped ones.
    ///
    /// An empty inventory is `Ok(vec![])`, not an error.
    async fn list_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRef>, GatewayError>;

    /// CPU utilization of one container as a fraction of a single CPU
    async fn cpu_fraction(&self, container: &ContainerRef) -> Result<f64, GatewayError>;

    /// Scale the service to `count` instances, returning once the runtime has applied it
    async fn apply_replica_count(&self, service: &ServiceIdentity, count: u32) -> Result<(), GatewayError>;
}
