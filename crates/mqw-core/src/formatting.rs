use reqwest::Url;

use crate::domain::NotificationSnapshot;

/// Number of body characters echoed when the notifications body is not JSON.
pub const BODY_EXCERPT_CHARS: usize = 100;

pub const SESSION_EXPIRED_ALERT: &str =
    "⚠️ Mostaql Alert: Login Cookie Expired. Update GitHub Secret.";

pub const TOKEN_EXPIRED_ALERT: &str =
    "⚠️ Mostaql Alert: Token Expired (401). Update GitHub Secret immediately!";

/// Alert text for a snapshot with unread items.
pub fn new_items_alert(snapshot: &NotificationSnapshot, dashboard_url: &Url) -> String {
    format!(
        "🔔 You have {} new alerts on Mostaql!\n({} Notifs, {} Msgs)\nCheck here: {}",
        snapshot.total(),
        snapshot.unread_notifications_count,
        snapshot.unread_messages_count,
        dashboard_url
    )
}

/// First `max_chars` characters of `body`, cut on a char boundary.
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
