use async_trait::async_trait;

use crate::error::NotifyError;

/// Port for delivering human-readable status messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best-effort delivery of a single message
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}
