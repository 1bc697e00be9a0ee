use serde::Deserialize;

/// Unread counters returned by the notifications endpoint.
///
/// The endpoint returns more fields than these; everything else is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationSnapshot {
    #[serde(default)]
    pub unread_notifications_count: u64,
    #[serde(default)]
    pub unread_messages_count: u64,
}

impl NotificationSnapshot {
    pub fn total(&self) -> u64 {
        self.unread_notifications_count
            .saturating_add(self.unread_messages_count)
    }
}

/// Transport-neutral view of the notifications response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedResponse {
    pub status: u16,
    /// Raw `Content-Type` header, empty when the server sent none.
    pub content_type: String,
    /// URL after redirects were followed.
    pub final_url: String,
    pub body: String,
}

impl FetchedResponse {
    /// An HTML page or a bounce to the login form both mean the cookie is dead.
    pub fn looks_like_login_page(&self) -> bool {
        self.content_type.contains("text/html") || self.final_url.contains("login")
    }
}
