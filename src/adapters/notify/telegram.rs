use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::NotifyError;
use crate::ports::Notifier;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Sends messages to a fixed set of Telegram chats through the Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_ids: Vec<i64>,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_ids: Vec<i64>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            token: token.into(),
            chat_ids,
        })
    }

    /// Point at a different Bot API server
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), self.token)
    }

    async fn send_to(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.send_message_url())
            .json(&SendMessage { chat_id, text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(format!(
                "telegram chat {} returned {}",
                chat_id,
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let mut first_error = None;

        for &chat_id in &self.chat_ids {
            if let Err(e) = self.send_to(chat_id, message).await {
                warn!(chat_id, "Failed to deliver telegram message: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
