//! Chat notification delivery

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::TelegramConfig;
use crate::error::{Error, Result};

/// Best-effort message delivery.
///
/// Implementations must swallow their own failures: the poller never
/// learns whether a message arrived.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to the configured chat
    async fn notify(&self, message: &str);
}

/// Sends messages to a single chat through the Telegram Bot API
pub struct TelegramNotifier {
    client: Client,
    send_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a new notifier
    pub fn new(config: &TelegramConfig, token: &str, chat_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                token
            ),
            chat_id: chat_id.into(),
        })
    }

    /// Send a message, reporting any failure to the caller
    pub async fn send_message(&self, text: &str) -> std::result::Result<(), NotificationError> {
        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text,
        };

        // The URL carries the bot token, keep it out of error messages.
        let response = self
            .client
            .post(&self.send_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::HttpError(e.without_url().to_string()))?;

        let status = response.status();
        let reply: Option<TelegramReply> = response.json().await.ok();

        match reply {
            Some(TelegramReply { ok: true, .. }) if status.is_success() => Ok(()),
            Some(TelegramReply { description, .. }) => Err(NotificationError::Rejected {
                status: status.as_u16(),
                description: description.unwrap_or_default(),
            }),
            None => Err(NotificationError::Rejected {
                status: status.as_u16(),
                description: "unreadable reply".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) {
        info!(chat_id = %self.chat_id, %message, "Sending message");

        match self.send_message(message).await {
            Ok(()) => debug!(chat_id = %self.chat_id, "Message delivered"),
            Err(e) => error!(chat_id = %self.chat_id, error = %e, "Failed to send message"),
        }
    }
}

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The request never got a reply
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Telegram answered but did not accept the message
    #[error("Telegram returned {status}: {description}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Telegram's explanation, if any
        description: String,
    },
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}
