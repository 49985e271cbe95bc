//! HTTP transport used by every network-facing provider.
//!
//! Providers never talk to `ureq` directly; they receive an `Arc<dyn HttpFetch>`
//! so tests can script responses without touching the network.

use super::types::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// A completed HTTP exchange. Non-2xx statuses are returned here, not as errors,
/// so each provider can apply its own success criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

/// Issues unauthenticated GET requests.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool.
#[derive(Clone)]
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build();
        Self { agent }
    }

    fn get_blocking(agent: &ureq::Agent, url: &str) -> Result<HttpResponse, TransportError> {
        let response = match agent.get(url).call() {
            Ok(r) => r,
            // 4xx/5xx still carry a body some providers inspect
            Err(ureq::Error::Status(_, r)) => r,
            Err(e) => return Err(TransportError::Network(e.to_string())),
        };
        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpFetch for UreqFetcher {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        tracing::debug!(%url, "GET");
        tokio::task::spawn_blocking(move || Self::get_blocking(&agent, &url))
            .await
            .map_err(|e| TransportError::Network(format!("transport task failed: {}", e)))?
    }
}
