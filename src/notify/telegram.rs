//! Telegram Bot API notifier

use super::{Notifier, NotifyError, NotifyResult};
use crate::config::NotifierConfig;
use async_trait::async_trait;
use reqwest::Client;

/// Telegram's legacy markup mode; the report is written for it
const PARSE_MODE: &str = "Markdown";

/// Sends messages through the Bot API `sendMessage` method
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    thread_id: Option<String>,
}

impl TelegramNotifier {
    /// Builds a notifier from configuration
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Missing` when the bot token or chat id is unset.
    pub fn new(config: &NotifierConfig, client: Client) -> NotifyResult<Self> {
        let token = non_blank(&config.bot_token).ok_or(NotifyError::Missing("bot token"))?;
        let chat_id = non_blank(&config.chat_id).ok_or(NotifyError::Missing("chat id"))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                token
            ),
            chat_id: chat_id.to_string(),
            thread_id: non_blank(&config.thread_id).map(str::to_string),
        })
    }

    fn form(&self, text: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("chat_id", self.chat_id.clone()),
            ("text", text.to_string()),
            ("parse_mode", PARSE_MODE.to_string()),
        ];
        if let Some(thread_id) = &self.thread_id {
            form.push(("message_thread_id", thread_id.clone()));
        }
        form
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> NotifyResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&self.form(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Telegram accepted message for chat {}", self.chat_id);
        Ok(())
    }
}
