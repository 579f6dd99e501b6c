//! Telegram group messaging over the Bot HTTP API. Used two ways: group id
//! discovery during provisioning (one getUpdates poll) and best-effort
//! notification during the ask pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::TelegramBot;

#[async_trait]
pub trait TelegramGateway: Send + Sync {
    /// Chat id of the first pending update for the bot, preferring channel
    /// posts over direct messages. None when the updates feed is empty.
    async fn first_chat_id(&self, bot_token: &str) -> Result<Option<String>, String>;

    async fn send_group_message(&self, bot: &TelegramBot, text: &str) -> Result<(), String>;
}

pub struct TelegramClient {
    client: Client,
}

impl TelegramClient {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

/// Pull the chat id out of a getUpdates payload, channel post first.
pub(crate) fn chat_id_from_updates(updates: &Value) -> Option<String> {
    let first = updates["result"].as_array()?.first()?;
    let chat_id = first["channel_post"]["chat"]["id"]
        .as_i64()
        .or_else(|| first["message"]["chat"]["id"].as_i64())?;
    Some(chat_id.to_string())
}

#[async_trait]
impl TelegramGateway for TelegramClient {
    async fn first_chat_id(&self, bot_token: &str) -> Result<Option<String>, String> {
        let url = format!("https://api.telegram.org/bot{}/getUpdates", bot_token);
        let updates: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("getUpdates request failed: {}", e))?
            .json()
            .await
            .map_err(|e| format!("getUpdates returned invalid JSON: {}", e))?;

        Ok(chat_id_from_updates(&updates))
    }

    async fn send_group_message(&self, bot: &TelegramBot, text: &str) -> Result<(), String> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", bot.bot_token);
        let body = json!({
            "chat_id": bot.group_id,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("sendMessage request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("sendMessage returned {}", response.status()));
        }
        Ok(())
    }
}
