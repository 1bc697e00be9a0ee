use std::{env, fs, path::Path, time::Duration};

use reqwest::Url;
use tracing::warn;

use crate::{errors::Error, Result};

pub const DEFAULT_NOTIFICATIONS_URL: &str = "https://mostaql.com/ajax/notifications";
pub const DEFAULT_DASHBOARD_URL: &str = "https://mostaql.com/dashboard";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram credentials. Both halves are required for alerts to go out.
#[derive(Clone, Debug)]
pub struct TelegramSettings {
    pub bot_token: String,
    /// Numeric chat id or `@channelusername`.
    pub chat_id: String,
    pub api_url: Url,
    pub timeout: Duration,
}

/// Typed configuration, built once at process start and passed down.
#[derive(Clone, Debug)]
pub struct Config {
    // Marketplace
    pub mostaql_cookie: String,
    pub notifications_url: Url,
    pub dashboard_url: Url,
    pub fetch_timeout: Duration,

    /// `None` when the bot token or chat id is missing; alerts are then dropped.
    pub telegram: Option<TelegramSettings>,
}

impl Config {
    /// Load from the process environment, seeding it from `./.env` first.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// The cookie is checked first so a missing cookie fails before anything
    /// else is parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let mostaql_cookie = get("MOSTAQL_COOKIE").ok_or(Error::MissingCookie)?;

        let bot_token = get("TELEGRAM_TOKEN");
        let chat_id = get("TELEGRAM_CHAT_ID");
        if bot_token.is_none() || chat_id.is_none() {
            warn!("Telegram secrets are missing; alerts will not be delivered");
        }

        let notifications_url = parse_url(
            "MOSTAQL_NOTIFICATIONS_URL",
            get("MOSTAQL_NOTIFICATIONS_URL"),
            DEFAULT_NOTIFICATIONS_URL,
        )?;
        let dashboard_url = parse_url(
            "MOSTAQL_DASHBOARD_URL",
            get("MOSTAQL_DASHBOARD_URL"),
            DEFAULT_DASHBOARD_URL,
        )?;
        let fetch_timeout =
            Duration::from_secs(parse_u64(get("FETCH_TIMEOUT_SECS")).unwrap_or(30));

        let telegram = match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramSettings {
                bot_token,
                chat_id,
                api_url: parse_url(
                    "TELEGRAM_API_URL",
                    get("TELEGRAM_API_URL"),
                    DEFAULT_TELEGRAM_API_URL,
                )?,
                timeout: Duration::from_secs(
                    parse_u64(get("TELEGRAM_TIMEOUT_SECS")).unwrap_or(10),
                ),
            }),
            _ => None,
        };

        Ok(Self {
            mostaql_cookie,
            notifications_url,
            dashboard_url,
            fetch_timeout,
            telegram,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_url(key: &str, value: Option<String>, default: &str) -> Result<Url> {
    let raw = value.unwrap_or_else(|| default.to_string());
    Url::parse(&raw).map_err(|e| Error::Config(format!("{key} is not a valid URL ({raw}): {e}")))
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
