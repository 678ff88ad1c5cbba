pub mod controller;
pub mod policy;
pub mod sampler;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Autoscaler, AutoscalerStatus};
pub use sampler::CpuSampler;
