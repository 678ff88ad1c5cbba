pub mod container;
pub mod metrics;
pub mod scaling;
pub mod service;

pub use container::{ContainerId, ContainerRef, ContainerSample, ContainerState};
pub use metrics::{cpu_fraction, CpuUsage};
pub use scaling::ScalingConfig;
pub use service::ServiceIdentity;
