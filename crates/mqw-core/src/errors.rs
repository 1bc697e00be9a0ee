/// Core error type for the notification watcher.
///
/// Adapter crates map their library errors into this type so the checker can
/// tell a dead connection apart from a bad status or an unreadable body.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("MOSTAQL_COOKIE environment variable is required")]
    MissingCookie,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("could not parse notifications body: {source}")]
    MalformedBody {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
