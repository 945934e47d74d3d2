//! Telegram Bot API transport.
//!
//! A minimal long-polling client: `getUpdates`, `sendMessage` and
//! `sendPhoto` are all the bot needs.

use crate::bot::commands::{Dispatcher, Reply};
use crate::config::BotConfig;
use crate::report::ChartRenderer;
use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Telegram's message length limit, in UTF-16 code units.
pub const MAX_MESSAGE_UNITS: usize = 4096;

/// Errors returned by the Bot API client.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// An incoming update. Only messages are requested.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Bot API client bound to one token.
pub struct TelegramClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a client. The HTTP timeout leaves room for long polls.
    pub fn new(api_url: &str, token: &str, poll_timeout_seconds: u64) -> Result<Self, TelegramError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_seconds + 15))
            .build()?;

        Ok(Self {
            http_client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TelegramError> {
        let response: ApiResponse<T> = request.send().await?.json().await?;

        if !response.ok {
            return Err(TelegramError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        response
            .result
            .ok_or_else(|| TelegramError::Api("response without result".to_string()))
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_seconds: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = self.http_client.post(self.method_url("getUpdates")).json(&json!({
            "offset": offset,
            "timeout": timeout_seconds,
            "allowed_updates": ["message"],
        }));

        self.call(request).await
    }

    /// Send a text message, split into several if it is too long.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        for chunk in split_message(text, MAX_MESSAGE_UNITS) {
            let request = self
                .http_client
                .post(self.method_url("sendMessage"))
                .json(&json!({
                    "chat_id": chat_id,
                    "text": chunk,
                    "disable_web_page_preview": true,
                }));

            let _: serde_json::Value = self.call(request).await?;
        }
        Ok(())
    }

    /// Upload a PNG image.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        file_name: &str,
        png: Vec<u8>,
    ) -> Result<(), TelegramError> {
        let photo = Part::bytes(png)
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", photo);

        let request = self
            .http_client
            .post(self.method_url("sendPhoto"))
            .multipart(form);

        let _: serde_json::Value = self.call(request).await?;
        Ok(())
    }
}

/// Split text into chunks of at most `limit` UTF-16 units, preferring line
/// breaks. A single overlong line is cut on char boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            for c in line.chars() {
                if current_len + c.len_utf16() > limit {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(c);
                current_len += c.len_utf16();
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Send a reply: the text, then the chart if there is one.
async fn deliver(
    client: &TelegramClient,
    renderer: &ChartRenderer,
    chat_id: i64,
    reply: &Reply,
) -> Result<()> {
    client.send_message(chat_id, &reply.text).await?;

    if let Some(ref chart) = reply.chart {
        let png = renderer.rasterize(&chart.svg)?;
        client.send_photo(chat_id, &chart.file_name, png).await?;
    }

    Ok(())
}

/// Answer one update. Failures are logged, never propagated.
pub async fn handle_update(client: &TelegramClient, dispatcher: &Dispatcher, update: &Update) {
    let Some(ref message) = update.message else {
        return;
    };
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(reply) = dispatcher.handle(text) else {
        debug!("Ignoring non-command message in chat {}", message.chat.id);
        return;
    };

    if let Err(e) = deliver(client, dispatcher.renderer(), message.chat.id, &reply).await {
        warn!("Failed to reply in chat {}: {:#}", message.chat.id, e);
    }
}

/// Poll for updates until Ctrl-C.
pub async fn run_polling(
    client: &TelegramClient,
    dispatcher: &Dispatcher,
    config: &BotConfig,
) -> Result<()> {
    let mut offset: i64 = 0;
    info!("Bot started, polling for updates (Ctrl-C to stop)");

    loop {
        let polled = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down bot");
                return Ok(());
            }
            polled = client.get_updates(offset, config.poll_timeout_seconds) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in &updates {
                    offset = offset.max(update.update_id + 1);
                    handle_update(client, dispatcher, update).await;
                }
            }
            Err(e) => {
                warn!(
                    "Polling failed: {}. Retrying in {}s",
                    e, config.retry_delay_seconds
                );
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutting down bot");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.retry_delay_seconds)) => {}
                }
            }
        }
    }
}
