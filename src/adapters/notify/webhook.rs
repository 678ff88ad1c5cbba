use std::time::Duration;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::ports::Notifier;

/// Posts `{"text": ...}` JSON to a generic webhook (Slack/Mattermost compatible)
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(format!("webhook returned {}", response.status())));
        }

        Ok(())
    }
}
