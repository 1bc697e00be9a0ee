use async_trait::async_trait;
use tracing::warn;

use crate::{
    messaging::port::{Delivery, MessagingPort},
    Result,
};

/// Stand-in used when the Telegram token or chat id is not configured.
///
/// Alerts are logged and dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledMessenger;

#[async_trait]
impl MessagingPort for DisabledMessenger {
    async fn send_text(&self, text: &str) -> Result<Delivery> {
        warn!("Telegram is not configured, dropping alert: {text}");
        Ok(Delivery::Dropped)
    }
}
