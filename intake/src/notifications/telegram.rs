//! Telegram Bot API notifier.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::{Notifier, NotifyError};
use crate::config::TelegramConfig;
use crate::storage::SettingsStore;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends messages through `sendMessage` using the bot token and chat id currently stored in
/// the settings file, so updates take effect without a restart.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: Url,
    settings: Arc<SettingsStore>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, settings: Arc<SettingsStore>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            settings,
        })
    }

    fn send_message_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base.as_str().trim_end_matches('/'), token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let settings = self.settings.load().await;
        if !settings.is_enabled() {
            tracing::debug!("Telegram notifications not configured, skipping");
            return Ok(());
        }

        let body = SendMessage {
            chat_id: &settings.chat_id,
            text,
            parse_mode: "HTML",
        };

        // The token is part of the URL, so never log the URL or the raw reqwest error
        let response = self
            .client
            .post(self.send_message_url(&settings.bot_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(chat_id = %settings.chat_id, "Telegram message sent");
        Ok(())
    }
}
