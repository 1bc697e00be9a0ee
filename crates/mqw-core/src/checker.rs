//! One pass over the notifications endpoint.
//!
//! `classify` decides what a response means without doing any I/O;
//! `NotificationChecker::check_once` wires it to a source and a messenger and
//! turns every failure into a `CheckOutcome`.

use std::sync::Arc;

use reqwest::Url;
use tracing::{error, info, warn};

use crate::{
    domain::{FetchedResponse, NotificationSnapshot},
    errors::Error,
    formatting::{
        body_excerpt, new_items_alert, BODY_EXCERPT_CHARS, SESSION_EXPIRED_ALERT,
        TOKEN_EXPIRED_ALERT,
    },
    messaging::port::{Delivery, MessagingPort},
    ports::NotificationSource,
    Result,
};

/// Meaning of a response that was read successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// HTML or a login redirect: the session cookie is dead.
    SessionExpired,
    /// HTTP 401.
    TokenExpired,
    NewItems(NotificationSnapshot),
    NothingNew(NotificationSnapshot),
}

/// How a single check ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Alerted(NotificationSnapshot),
    NothingNew,
    SessionExpired,
    TokenExpired,
    /// No usable response was obtained (transport or adapter failure).
    TransportFailed,
    MalformedBody,
    UnexpectedStatus(u16),
}

impl CheckOutcome {
    /// Process exit code for this outcome. Only a dead session is fatal.
    pub fn exit_code(&self) -> u8 {
        match self {
            CheckOutcome::SessionExpired => 1,
            _ => 0,
        }
    }
}

/// Interpret a fetched response.
///
/// The login-page check runs before any status branching, so an HTML error
/// page with status 500 still reads as an expired session.
pub fn classify(resp: &FetchedResponse) -> Result<Verdict> {
    if resp.looks_like_login_page() {
        return Ok(Verdict::SessionExpired);
    }

    match resp.status {
        200 => {
            let snapshot: NotificationSnapshot =
                serde_json::from_str(&resp.body).map_err(|source| Error::MalformedBody {
                    source,
                    excerpt: body_excerpt(&resp.body, BODY_EXCERPT_CHARS),
                })?;
            if snapshot.total() > 0 {
                Ok(Verdict::NewItems(snapshot))
            } else {
                Ok(Verdict::NothingNew(snapshot))
            }
        }
        401 => Ok(Verdict::TokenExpired),
        other => Err(Error::UnexpectedStatus(other)),
    }
}

pub struct NotificationChecker {
    source: Arc<dyn NotificationSource>,
    messenger: Arc<dyn MessagingPort>,
    dashboard_url: Url,
}

impl NotificationChecker {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        messenger: Arc<dyn MessagingPort>,
        dashboard_url: Url,
    ) -> Self {
        Self {
            source,
            messenger,
            dashboard_url,
        }
    }

    /// Run one check. Never fails; every failure is logged and reported as an outcome.
    pub async fn check_once(&self) -> CheckOutcome {
        info!("--- Starting notifications check ---");

        match self.run().await {
            Ok(outcome) => outcome,
            Err(Error::MalformedBody { source, excerpt }) => {
                error!("Could not parse JSON, the server returned something else: {source}");
                error!("Body starts with: {excerpt}");
                CheckOutcome::MalformedBody
            }
            Err(Error::UnexpectedStatus(code)) => {
                warn!("Unexpected status code: {code}");
                CheckOutcome::UnexpectedStatus(code)
            }
            Err(e) => {
                error!("Notifications check failed: {e}");
                CheckOutcome::TransportFailed
            }
        }
    }

    async fn run(&self) -> Result<CheckOutcome> {
        let resp = self.source.fetch().await?;

        let outcome = match classify(&resp)? {
            Verdict::SessionExpired => {
                warn!("🚨 Cookie invalid! Redirected to login page.");
                self.alert(SESSION_EXPIRED_ALERT).await;
                CheckOutcome::SessionExpired
            }
            Verdict::TokenExpired => {
                warn!("🚨 401 Unauthorized! Token expired.");
                self.alert(TOKEN_EXPIRED_ALERT).await;
                CheckOutcome::TokenExpired
            }
            Verdict::NewItems(snapshot) => {
                log_counts(&snapshot);
                info!("Sending Telegram alert...");
                self.alert(&new_items_alert(&snapshot, &self.dashboard_url))
                    .await;
                CheckOutcome::Alerted(snapshot)
            }
            Verdict::NothingNew(snapshot) => {
                log_counts(&snapshot);
                info!("No new notifications.");
                CheckOutcome::NothingNew
            }
        };
        Ok(outcome)
    }

    /// Send an alert; `None` when the messenger failed.
    async fn alert(&self, text: &str) -> Option<Delivery> {
        match self.messenger.send_text(text).await {
            Ok(Delivery::Sent) => {
                info!("Alert delivered");
                Some(Delivery::Sent)
            }
            Ok(Delivery::Dropped) => {
                warn!("Alert not delivered, no messaging channel is configured");
                Some(Delivery::Dropped)
            }
            Err(e) => {
                error!("Failed to send alert: {e}");
                None
            }
        }
    }
}

fn log_counts(snapshot: &NotificationSnapshot) {
    info!(
        "Notifications: {} | Messages: {}",
        snapshot.unread_notifications_count, snapshot.unread_messages_count
    );
    info!("Total Unread: {}", snapshot.total());
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;

    use super::*;

    /// Serves the same response (or the same transport failure) on every fetch.
    struct FakeSource {
        resp: Option<FetchedResponse>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn ok(status: u16, content_type: &str, body: &str) -> Arc<Self> {
            Self::with_url(status, content_type, "https://mostaql.com/ajax/notifications", body)
        }

        fn with_url(status: u16, content_type: &str, url: &str, body: &str) -> Arc<Self> {
            Arc::new(Self {
                resp: Some(FetchedResponse {
                    status,
                    content_type: content_type.to_string(),
                    final_url: url.to_string(),
                    body: body.to_string(),
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                resp: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NotificationSource for FakeSource {
        async fn fetch(&self) -> Result<FetchedResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.resp
                .clone()
                .ok_or_else(|| Error::Transport("connection refused".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingMessenger {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_text(&self, text: &str) -> Result<Delivery> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(Error::External("telegram error: 400 Bad Request".to_string()));
            }
            Ok(Delivery::Sent)
        }
    }

    const JSON: &str = "application/json";

    fn checker(
        source: Arc<FakeSource>,
        messenger: Arc<RecordingMessenger>,
    ) -> NotificationChecker {
        NotificationChecker::new(
            source,
            messenger,
            Url::parse("https://mostaql.com/dashboard").unwrap(),
        )
    }

    #[test]
    fn alert_decision_follows_total() {
        for (a, b) in [(0u64, 0u64), (0, 1), (1, 0), (7, 11), (0, 250)] {
            let body = format!(
                r#"{{"unread_notifications_count": {a}, "unread_messages_count": {b}, "x": []}}"#
            );
            let resp = FetchedResponse {
                status: 200,
                content_type: JSON.to_string(),
                final_url: "https://mostaql.com/ajax/notifications".to_string(),
                body,
            };
            match classify(&resp).unwrap() {
                Verdict::NewItems(s) => {
                    assert!(a + b > 0);
                    assert_eq!(s.total(), a + b);
                }
                Verdict::NothingNew(_) => assert_eq!(a + b, 0),
                other => panic!("unexpected verdict {other:?}"),
            }
        }
    }

    #[test]
    fn html_wins_over_status() {
        for status in [200, 401, 500] {
            let resp = FetchedResponse {
                status,
                content_type: "text/html; charset=UTF-8".to_string(),
                final_url: "https://mostaql.com/ajax/notifications".to_string(),
                body: "{\"unread_messages_count\": 3}".to_string(),
            };
            assert_eq!(classify(&resp).unwrap(), Verdict::SessionExpired);
        }
    }

    #[test]
    fn other_statuses_are_errors() {
        let resp = FetchedResponse {
            status: 503,
            content_type: JSON.to_string(),
            final_url: "https://mostaql.com/ajax/notifications".to_string(),
            body: String::new(),
        };
        assert!(matches!(classify(&resp), Err(Error::UnexpectedStatus(503))));
    }

    #[tokio::test]
    async fn unread_items_send_one_alert() {
        let source = FakeSource::ok(
            200,
            JSON,
            r#"{"unread_notifications_count": 3, "unread_messages_count": 2}"#,
        );
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert!(matches!(outcome, CheckOutcome::Alerted(s) if s.total() == 5));
        assert_eq!(outcome.exit_code(), 0);

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains('5'));
        assert!(sent[0].contains("3 Notifs"));
        assert!(sent[0].contains("2 Msgs"));
        assert!(sent[0].contains("https://mostaql.com/dashboard"));
    }

    #[tokio::test]
    async fn zero_unread_sends_nothing() {
        let source = FakeSource::ok(200, JSON, r#"{"unread_notifications_count": 0}"#);
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::NothingNew);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn html_response_alerts_and_is_fatal() {
        let source = FakeSource::ok(200, "text/html", "<html>login</html>");
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::SessionExpired);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(messenger.sent(), vec![SESSION_EXPIRED_ALERT.to_string()]);
    }

    #[tokio::test]
    async fn login_redirect_alerts_and_is_fatal() {
        let source = FakeSource::with_url(200, JSON, "https://mostaql.com/login", "{}");
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::SessionExpired);
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_alerts_but_is_not_fatal() {
        let source = FakeSource::ok(401, JSON, r#"{"error": "unauthorized"}"#);
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::TokenExpired);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(messenger.sent(), vec![TOKEN_EXPIRED_ALERT.to_string()]);
    }

    #[tokio::test]
    async fn unparsable_body_sends_nothing() {
        let source = FakeSource::ok(200, JSON, "Service temporarily unavailable");
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::MalformedBody);
        assert_eq!(outcome.exit_code(), 0);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn unexpected_status_sends_nothing() {
        let source = FakeSource::ok(502, JSON, "");
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::UnexpectedStatus(502));
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_sends_nothing() {
        let source = FakeSource::unreachable();
        let messenger = Arc::new(RecordingMessenger::default());
        let outcome = checker(source.clone(), messenger.clone())
            .check_once()
            .await;

        assert_eq!(outcome, CheckOutcome::TransportFailed);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_send_does_not_change_outcome() {
        let source = FakeSource::ok(401, JSON, "");
        let messenger = Arc::new(RecordingMessenger {
            fail: true,
            ..Default::default()
        });
        let outcome = checker(source, messenger.clone()).check_once().await;

        assert_eq!(outcome, CheckOutcome::TokenExpired);
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn repeated_checks_agree() {
        let source = FakeSource::ok(200, JSON, r#"{"unread_messages_count": 1}"#);
        let messenger = Arc::new(RecordingMessenger::default());
        let c = checker(source.clone(), messenger.clone());

        let first = c.check_once().await;
        let second = c.check_once().await;

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[tokio::test]
    async fn alert_reports_dropped_when_telegram_is_off() {
        let source = FakeSource::ok(401, JSON, "");
        let c = NotificationChecker::new(
            source,
            Arc::new(crate::messaging::disabled::DisabledMessenger),
            Url::parse("https://mostaql.com/dashboard").unwrap(),
        );

        assert_eq!(c.alert("hello").await, Some(Delivery::Dropped));
        assert_eq!(c.check_once().await, CheckOutcome::TokenExpired);
    }

    #[tokio::test]
    async fn alert_reports_sent_and_failed_sends() {
        let sent = checker(FakeSource::unreachable(), Arc::new(RecordingMessenger::default()));
        assert_eq!(sent.alert("hello").await, Some(Delivery::Sent));

        let failing = checker(
            FakeSource::unreachable(),
            Arc::new(RecordingMessenger {
                fail: true,
                ..Default::default()
            }),
        );
        assert_eq!(failing.alert("hello").await, None);
    }
}
