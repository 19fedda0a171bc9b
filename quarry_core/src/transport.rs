//! HTTP transport used by the source connectors.
//!
//! Connectors never talk to `reqwest` directly; they go through [`HttpFetch`]
//! so tests can swap in a canned transport.

use crate::error::ConnectorError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// Connect timeout for every outbound search request.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-request timeout for every outbound search request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

/// Minimal GET capability: fetch a URL and return the body as text.
///
/// Implementations must map non-success statuses to
/// [`ConnectorError::UpstreamStatus`].
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &str, headers: &HeaderMap) -> Result<String, ConnectorError>;
}

/// Default [`HttpFetch`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectorError::Other(format!("failed to build http client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (custom proxies, TLS roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_text(&self, url: &str, headers: &HeaderMap) -> Result<String, ConnectorError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(ConnectorError::HttpRequest)?;

        let status = response.status();
        debug!(
            url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "GET completed"
        );

        if !status.is_success() {
            return Err(ConnectorError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(ConnectorError::HttpRequest)
    }
}
