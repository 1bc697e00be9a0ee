//! Telegram adapter (teloxide).
//!
//! Implements the `mqw-core` MessagingPort over the Bot API `sendMessage` call.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatId, Recipient},
};
use tracing::info;

use mqw_core::{
    config::TelegramSettings,
    errors::Error,
    messaging::port::{Delivery, MessagingPort},
    Result,
};

#[derive(Clone, Debug)]
pub struct TelegramMessenger {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, chat_id: &str) -> Self {
        Self {
            bot,
            recipient: recipient_for(chat_id),
        }
    }

    /// Bot with its own HTTP client so the send timeout is independent of the fetch.
    pub fn from_settings(settings: &TelegramSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Config(format!("telegram client build failed: {e}")))?;
        let bot = Bot::with_client(settings.bot_token.clone(), client)
            .set_api_url(settings.api_url.clone());
        Ok(Self::new(bot, &settings.chat_id))
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

/// Numeric ids address chats directly; anything else is a channel username.
pub fn recipient_for(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.to_string()),
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, text: &str) -> Result<Delivery> {
        self.bot
            .send_message(self.recipient.clone(), text.to_string())
            .await
            .map_err(Self::map_err)?;
        info!("Telegram message sent");
        Ok(Delivery::Sent)
    }
}
