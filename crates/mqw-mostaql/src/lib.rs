//! Mostaql adapter (notifications endpoint).
//!
//! Fetches `ajax/notifications` the way the dashboard's own XHR does, so the
//! server answers with JSON instead of a page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT},
    Url,
};
use tracing::debug;

use mqw_core::{
    config::Config, domain::FetchedResponse, errors::Error, ports::NotificationSource, Result,
};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const XHR_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

#[derive(Clone, Debug)]
pub struct MostaqlClient {
    url: Url,
    http: reqwest::Client,
}

impl MostaqlClient {
    pub fn new(url: Url, cookie: &str, referer: &Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(request_headers(cookie, referer)?)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { url, http })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.notifications_url.clone(),
            &cfg.mostaql_cookie,
            &cfg.dashboard_url,
            cfg.fetch_timeout,
        )
    }
}

/// Header set the marketplace expects from its dashboard XHR.
pub fn request_headers(cookie: &str, referer: &Url) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(XHR_ACCEPT));
    // Without this the endpoint serves HTML.
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

    let mut cookie = HeaderValue::from_str(cookie.trim())
        .map_err(|_| Error::Config("MOSTAQL_COOKIE contains invalid characters".to_string()))?;
    cookie.set_sensitive(true);
    headers.insert(COOKIE, cookie);

    let referer = HeaderValue::from_str(referer.as_str())
        .map_err(|_| Error::Config(format!("invalid referer: {referer}")))?;
    headers.insert(REFERER, referer);

    Ok(headers)
}

#[async_trait]
impl NotificationSource for MostaqlClient {
    async fn fetch(&self) -> Result<FetchedResponse> {
        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| Error::Transport(format!("mostaql request error: {e}")))?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        debug!("mostaql responded {status} ({content_type}) from {final_url}");

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("mostaql body read error: {e}")))?;

        Ok(FetchedResponse {
            status,
            content_type,
            final_url,
            body,
        })
    }
}
