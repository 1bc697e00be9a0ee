use async_trait::async_trait;

use crate::Result;

/// What happened to an alert the port accepted without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No channel is configured; the alert was only logged.
    Dropped,
}

/// Port for pushing a plain-text alert to the operator.
///
/// Implementations report failures through `Result`; callers decide whether a
/// failed send matters. The checker never lets one change its outcome.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<Delivery>;
}
