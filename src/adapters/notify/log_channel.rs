use async_trait::async_trait;
use tracing::info;

use crate::error::NotifyError;
use crate::ports::Notifier;

/// Notifier that only writes to the application log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "dockscale::notify", "{}", message);
        Ok(())
    }
}
