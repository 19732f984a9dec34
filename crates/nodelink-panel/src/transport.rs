//! HTTP transport to the panel.
//!
//! The [`Transport`] trait is the seam between the sync client and the
//! network: the client only builds paths and bodies and interprets the
//! returned status + body. [`HttpTransport`] is the reqwest implementation
//! with the panel's shared-secret headers, a per-request timeout and
//! bounded retries.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use nodelink_core::defaults::{DEFAULT_RETRY_BASE_DELAY_MS, HEADER_KEY, HEADER_TIMESTAMP};
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::PanelError;

/// HTTP method used by panel endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Raw panel response before envelope decoding.
#[derive(Debug, Clone)]
pub struct PanelResponse {
    /// Full URL the request went to, for diagnostics.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Sends one request to the panel.
///
/// Implementations must be thread-safe (`Send + Sync`); the sync client is
/// shared by the polling loop and the reporting timers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to `path` (relative to the panel base URL).
    ///
    /// Errors only when no response was received; HTTP error statuses are
    /// returned as a normal [`PanelResponse`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<PanelResponse, PanelError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    #[inline]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<PanelResponse, PanelError> {
        (**self).send(method, path, body).await
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    key: String,
    retry_count: u32,
    retry_delay: Duration,
}

impl HttpTransport {
    /// Create a transport with its own client.
    ///
    /// `timeout` bounds each attempt; a request that never gets a response
    /// is retried up to `retry_count` more times.
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        timeout: Duration,
        retry_count: u32,
    ) -> Result<Self, PanelError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PanelError::Transport {
                url: base_url.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_client(client, base_url, key, retry_count))
    }

    /// Create with a custom reqwest [`Client`] (for proxies, custom TLS, etc.).
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        key: impl Into<String>,
        retry_count: u32,
    ) -> Self {
        let base = base_url.into();
        Self {
            client,
            base_url: base.trim_end_matches('/').to_string(),
            key: key.into(),
            retry_count,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }

    /// Set the base delay between retries (multiplied by the attempt number).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<PanelResponse, PanelError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;

        loop {
            let mut req = self
                .client
                .request(method.into(), &url)
                .header(HEADER_KEY, &self.key)
                .header(HEADER_TIMESTAMP, unix_now().to_string());
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.map_err(|e| PanelError::Transport {
                        url: url.clone(),
                        message: format!("failed to read response body: {e}"),
                    })?;
                    debug!(%url, status, bytes = body.len(), "panel responded");
                    return Ok(PanelResponse { url, status, body });
                }
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(%url, attempt, error = %e, "panel request failed, retrying");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                Err(e) => {
                    return Err(PanelError::Transport {
                        url,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
