pub mod notifier;
pub mod runtime_gateway;

pub use notifier::Notifier;
pub use runtime_gateway::RuntimeGateway;
