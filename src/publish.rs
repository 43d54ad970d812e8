//! Telegram channel publisher.
//!
//! Uploads the composed photo with its caption via the Bot API's
//! `sendPhoto` method. No retries here; failures propagate to the job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::error::PublishError;

/// Capability to deliver a composed photo with its caption.
#[async_trait]
pub trait PublishSink: Send + Sync {
    /// Publishes the image and caption to the destination channel.
    async fn publish(&self, image_bytes: Vec<u8>, caption: &str) -> Result<(), PublishError>;
}

/// Publisher backed by the Telegram Bot API.
pub struct TelegramPublisher {
    /// Bot token.
    bot_token: String,
    /// Target channel in `@name` form.
    channel_id: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl TelegramPublisher {
    /// Creates a new publisher for the given bot and channel.
    pub fn new(bot_token: String, channel_id: String) -> Self {
        Self {
            bot_token,
            channel_id,
            http_client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

/// Internal Telegram API response envelope.
#[derive(Debug, Deserialize)]
struct ApiTelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl PublishSink for TelegramPublisher {
    async fn publish(&self, image_bytes: Vec<u8>, caption: &str) -> Result<(), PublishError> {
        tracing::info!(channel = %self.channel_id, "Publishing photo to Telegram");

        let url = format!("https://api.telegram.org/bot{}/sendPhoto", self.bot_token);

        let photo = Part::bytes(image_bytes)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| PublishError::RequestFailed(e.to_string()))?;

        let form = Form::new()
            .text("chat_id", self.channel_id.clone())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body: ApiTelegramResponse = response
            .json()
            .await
            .map_err(|e| PublishError::RequestFailed(e.to_string()))?;

        if !status.is_success() || !body.ok {
            return Err(PublishError::Api {
                code: status.as_u16(),
                message: body
                    .description
                    .unwrap_or_else(|| "Telegram rejected the request".to_string()),
            });
        }

        tracing::info!("Photo published successfully");
        Ok(())
    }
}
