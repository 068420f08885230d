//! HTTP client abstraction for the remote status API.
//!
//! The fetcher only ever needs a bounded GET that hands back the status code and
//! raw body. Keeping that behind a trait lets tests script responses (including
//! responses that never arrive) without a network.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::Error as CoreError;

/// Raw reply: status code plus body text, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Network(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tornwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport)?;
        Ok(HttpResponse { status, body })
    }
}

fn map_transport(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}
