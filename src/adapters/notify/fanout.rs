use std::sync::Arc;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::ports::Notifier;

/// Delivers each message to every configured channel
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    channels: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: Arc<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    /// Attempts every channel; returns the first failure, if any
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let mut first_error = None;

        for channel in &self.channels {
            if let Err(e) = channel.send(message).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::RecordingNotifier;

    #[tokio::test]
    async fn test_failure_does_not_skip_other_channels() {
        let broken = Arc::new(RecordingNotifier::failing());
        let healthy = Arc::new(RecordingNotifier::new());
        let fanout = FanoutNotifier::new()
            .with_channel(broken.clone())
            .with_channel(healthy.clone());

        assert!(fanout.send("Autoscale: 1 -> 2 replicas (CPU avg=0.90)").await.is_err());
        assert_eq!(broken.messages().len(), 1);
        assert_eq!(healthy.messages(), vec!["Autoscale: 1 -> 2 replicas (CPU avg=0.90)"]);
    }

    #[tokio::test]
    async fn test_empty_fanout_succeeds() {
        let fanout = FanoutNotifier::new();
        assert!(fanout.send("hello").await.is_ok());
    }
}
