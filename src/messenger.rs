//! Outbound message delivery
//!
//! The bot needs two primitives: send a text to a user, optionally with the
//! hint button attached, and acknowledge a button press so the client stops
//! waiting on it. [`TelegramMessenger`] implements both on top of the
//! Telegram Bot API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::DeliveryError;

/// Callback payload carried by the hint button
pub const HINT_CALLBACK: &str = "hint";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Interactive affordance attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hint,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn deliver(
        &self,
        user_id: &str,
        text: &str,
        action: Option<Action>,
    ) -> Result<(), DeliveryError>;

    /// Confirm receipt of a button press
    async fn acknowledge(&self, callback_id: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramMessenger {
    client: Client,
    base_url: String,
}

impl TelegramMessenger {
    pub fn new(api_base: &str, token: &str) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<(), DeliveryError> {
        let response: ApiResponse = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(DeliveryError::Rejected(
                response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn deliver(
        &self,
        user_id: &str,
        text: &str,
        action: Option<Action>,
    ) -> Result<(), DeliveryError> {
        let chat_id: i64 = user_id
            .parse()
            .map_err(|_| DeliveryError::InvalidRecipient(user_id.to_string()))?;

        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(Action::Hint) = action {
            body["reply_markup"] = json!({
                "inline_keyboard": [[{ "text": "Hint", "callback_data": HINT_CALLBACK }]]
            });
        }

        self.call("sendMessage", &body).await?;
        debug!("Delivered message to {}", user_id);
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), DeliveryError> {
        self.call(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_id }),
        )
        .await?;
        debug!("Answered callback query {}", callback_id);
        Ok(())
    }
}
