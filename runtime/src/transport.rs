//! `reqwest`-backed transport

use crate::config::{ConfigError, FetchConfig};
use fetch_middleware_core::{ApiError, RequestConfig, Response, Transport};
use futures::future::BoxFuture;
use http::StatusCode;
use reqwest::Client;
use serde_json::Value;

/// Transport issuing requests with a shared `reqwest` client
///
/// Cloning is cheap; clones share the client's connection pool.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a transport around an existing client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Create a transport whose client follows `config`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the client cannot be built (e.g. no TLS backend).
    pub fn from_config(config: &FetchConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn fetch(
        &self,
        endpoint: String,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Box<dyn Response>, ApiError>> {
        let RequestConfig {
            method,
            headers,
            body,
            options,
        } = config;

        if !options.is_empty() {
            tracing::trace!(
                options = ?options.keys().collect::<Vec<_>>(),
                "Transport options not applicable to reqwest, ignoring"
            );
        }

        let mut request = self.client.request(method, endpoint.as_str()).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            Ok(Box::new(ReqwestResponse { inner: response }) as Box<dyn Response>)
        })
    }
}

struct ReqwestResponse {
    inner: reqwest::Response,
}

impl Response for ReqwestResponse {
    fn status(&self) -> StatusCode {
        self.inner.status()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.inner
            .headers()
            .get(name)?
            .to_str()
            .ok()
            .map(str::to_owned)
    }

    fn json(self: Box<Self>) -> BoxFuture<'static, Result<Value, ApiError>> {
        Box::pin(async move {
            self.inner
                .json::<Value>()
                .await
                .map_err(|e| ApiError::MalformedBody(e.to_string()))
        })
    }

    fn text(self: Box<Self>) -> BoxFuture<'static, Result<String, ApiError>> {
        Box::pin(async move {
            self.inner
                .text()
                .await
                .map_err(|e| ApiError::MalformedBody(e.to_string()))
        })
    }
}
