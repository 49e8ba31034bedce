//! Traffic Ops session over HTTP.
//!
//! # Responsibilities
//! - Authenticate with `POST /api/4.0/user/login` and hold the session cookie
//! - Fetch `GET /api/4.0/cdns/{cdn}/snapshot` and unwrap its `response` member
//! - Take the modification time from `Last-Modified`, falling back to fetch time
//! - Keep the session logged in from a background task

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::header::{COOKIE, LAST_MODIFIED, SET_COOKIE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use url::Url;

use crate::config::schema::AuthorityConfig;
use crate::crconfig::Freshness;
use crate::http::date::parse_http_date;
use crate::session::{ConfigAuthoritySession, ConfigDocument, SessionError};

const API_VERSION: &str = "4.0";

#[derive(Deserialize)]
struct SnapshotResponse<'a> {
    #[serde(borrow)]
    response: &'a RawValue,
}

/// Authenticated client for the Traffic Ops snapshot API.
pub struct TrafficOpsSession {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    cookie: ArcSwapOption<String>,
}

impl TrafficOpsSession {
    /// Build an unauthenticated session. Call [`login`](Self::login) or
    /// spawn [`run`](Self::run) before fetching.
    pub fn new(config: &AuthorityConfig, timeout: Duration) -> Result<Self, SessionError> {
        let base_url: Url = config
            .url
            .parse()
            .map_err(|e| SessionError::Malformed(format!("invalid Traffic Ops URL '{}': {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SessionError::Malformed(format!(
                "Traffic Ops URL '{}' cannot carry a path",
                config.url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.insecure)
            .user_agent(concat!("crconfig-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            cookie: ArcSwapOption::empty(),
        })
    }

    /// Log in and store the session cookie.
    pub async fn login(&self) -> Result<(), SessionError> {
        let url = self.endpoint(&["user", "login"])?;
        let resp = self
            .client
            .post(url)
            .json(&serde_json::json!({ "u": self.username, "p": self.password }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SessionError::Unauthorized);
        }
        if !status.is_success() {
            return Err(SessionError::LoginFailed(status.as_u16()));
        }

        let cookie = session_cookie(resp.headers().get_all(SET_COOKIE).iter().filter_map(|v| v.to_str().ok()))
            .ok_or_else(|| SessionError::Malformed("login response carried no session cookie".to_string()))?;
        self.cookie.store(Some(Arc::new(cookie)));

        tracing::info!(url = %self.base_url, user = %self.username, "Logged in to Traffic Ops");
        Ok(())
    }

    /// Drop the session cookie.
    pub fn logout(&self) {
        self.cookie.store(None);
    }

    /// Keep the session logged in until shutdown.
    ///
    /// The first tick fires immediately, so this also performs the initial login.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = interval.as_secs(), "Traffic Ops session keeper starting");
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.is_connected() {
                        if let Err(e) = self.login().await {
                            tracing::warn!(url = %self.base_url, error = %e, "Traffic Ops login failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Traffic Ops session keeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SessionError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SessionError::Malformed(format!("Traffic Ops URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", API_VERSION])
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ConfigAuthoritySession for TrafficOpsSession {
    fn is_connected(&self) -> bool {
        self.cookie.load().is_some()
    }

    async fn fetch_latest_config(&self, cdn_name: &str) -> Result<ConfigDocument, SessionError> {
        let cookie = self.cookie.load_full().ok_or(SessionError::NotConnected)?;
        let url = self.endpoint(&["cdns", cdn_name, "snapshot"])?;

        let resp = self
            .client
            .get(url)
            .header(COOKIE, cookie.as_str())
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(cdn = %cdn_name, "Traffic Ops session expired");
                self.logout();
                return Err(SessionError::Unauthorized);
            }
            StatusCode::NOT_FOUND => return Err(SessionError::NotFound(cdn_name.to_string())),
            s => {
                return Err(SessionError::Status {
                    cdn: cdn_name.to_string(),
                    status: s.as_u16(),
                })
            }
        }

        // No Last-Modified means an unknown time, which never advances freshness.
        let modified = resp
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date)
            .unwrap_or_else(|| Freshness::ZERO.timestamp());
        let body = resp.bytes().await?;
        let payload = unwrap_snapshot(&body)?;

        tracing::debug!(cdn = %cdn_name, bytes = payload.len(), modified = %modified, "Fetched CRConfig snapshot");
        Ok(ConfigDocument { payload, modified })
    }
}

impl std::fmt::Debug for TrafficOpsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficOpsSession")
            .field("url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Join the `name=value` pairs of all `Set-Cookie` headers.
fn session_cookie<'a>(set_cookies: impl Iterator<Item = &'a str>) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}

/// Extract the CRConfig from a `{"response": ...}` snapshot body, verbatim.
fn unwrap_snapshot(body: &[u8]) -> Result<Vec<u8>, SessionError> {
    let snapshot: SnapshotResponse<'_> = serde_json::from_slice(body)
        .map_err(|e| SessionError::Malformed(format!("snapshot body: {}", e)))?;
    Ok(snapshot.response.get().as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> AuthorityConfig {
        AuthorityConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_encodes_cdn_name() {
        let session = TrafficOpsSession::new(&test_config("https://to.example.net/"), Duration::from_secs(5)).unwrap();
        let url = session.endpoint(&["cdns", "my cdn", "snapshot"]).unwrap();
        assert_eq!(url.as_str(), "https://to.example.net/api/4.0/cdns/my%20cdn/snapshot");

        let url = session.endpoint(&["cdns", "a/b", "snapshot"]).unwrap();
        assert_eq!(url.as_str(), "https://to.example.net/api/4.0/cdns/a%2Fb/snapshot");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = TrafficOpsSession::new(&test_config("not a url"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));

        let err = TrafficOpsSession::new(&test_config("mailto:ops@example.net"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = TrafficOpsSession::new(&test_config("http://localhost:1"), Duration::from_secs(1)).unwrap();
        assert!(!session.is_connected());
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_fetch_without_login_fails() {
        let session = TrafficOpsSession::new(&test_config("http://localhost:1"), Duration::from_secs(1)).unwrap();
        let err = session.fetch_latest_config("cdn1").await.unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }

    #[test]
    fn test_session_cookie_joins_pairs() {
        let headers = [
            "mojolicious=abc123; Path=/; HttpOnly",
            "access_token=xyz; Secure",
        ];
        assert_eq!(
            session_cookie(headers.into_iter()).as_deref(),
            Some("mojolicious=abc123; access_token=xyz")
        );
        assert_eq!(session_cookie(["HttpOnly"].into_iter()), None);
    }

    #[test]
    fn test_unwrap_snapshot_keeps_document_verbatim() {
        let body = br#"{"response": {"config": {"domain_name": "cdn.example.net"}, "stats": {"date": 1}}}"#;
        let payload = unwrap_snapshot(body).unwrap();
        assert_eq!(
            payload,
            br#"{"config": {"domain_name": "cdn.example.net"}, "stats": {"date": 1}}"#
        );

        assert!(matches!(unwrap_snapshot(b"{}"), Err(SessionError::Malformed(_))));
        assert!(matches!(unwrap_snapshot(b"<html>"), Err(SessionError::Malformed(_))));
    }
}
