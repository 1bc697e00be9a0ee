use async_trait::async_trait;

use crate::{domain::FetchedResponse, Result};

/// Port for reading the marketplace notifications endpoint.
///
/// Any HTTP status is a successful fetch; `Err` means no response was
/// obtained at all (DNS, connect, timeout, body read).
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch(&self) -> Result<FetchedResponse>;
}
