//! Scripted transport
//!
//! Replies are registered per method and endpoint and consumed in order, one
//! per request. Every request is recorded, matched or not.

use fetch_middleware_core::transport::reason_phrase;
use fetch_middleware_core::{ApiError, RequestConfig, Response, Transport};
use futures::future::BoxFuture;
use http::{Method, StatusCode};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A canned reply
#[derive(Debug, Clone)]
pub struct MockReply {
    outcome: Outcome,
    delay: Option<Duration>,
}

#[derive(Debug, Clone)]
enum Outcome {
    Respond(MockResponse),
    Fail(String),
    Hang,
}

impl MockReply {
    /// Reply with `status` and a plain-text body
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::respond(MockResponse::new(status, body.into()))
    }

    /// Reply with `status`, a JSON body and `Content-Type: application/json`
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::respond(
            MockResponse::new(status, body.to_string())
                .with_header("content-type", "application/json; charset=utf-8"),
        )
    }

    /// Fail without a response, like a refused connection
    #[must_use]
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail(message.into()),
            delay: None,
        }
    }

    /// Never settle
    #[must_use]
    pub const fn hang() -> Self {
        Self {
            outcome: Outcome::Hang,
            delay: None,
        }
    }

    /// Add a response header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Outcome::Respond(response) = &mut self.outcome {
            response.headers.push((name.into(), value.into()));
        }
        self
    }

    /// Override the status text (defaults to the canonical reason phrase)
    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        if let Outcome::Respond(response) = &mut self.outcome {
            response.status_text = Some(status_text.into());
        }
        self
    }

    /// Wait before replying
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    const fn respond(response: MockResponse) -> Self {
        Self {
            outcome: Outcome::Respond(response),
            delay: None,
        }
    }
}

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Resolved endpoint
    pub endpoint: String,
    /// Configuration handed to the transport
    pub config: RequestConfig,
}

impl RecordedRequest {
    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.config.method
    }

    /// Header value, if present and textual
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.config.headers.get(name)?.to_str().ok()
    }

    /// Request body
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.config.body.as_deref()
    }
}

/// Transport replying from a script
///
/// Share it with the middleware through an `Arc` to inspect requests afterwards:
///
/// ```ignore
/// let transport = Arc::new(MockTransport::new());
/// transport.reply(Method::GET, "http://example.com/foo", MockReply::text(200, "OK!"));
///
/// let middleware = FetchMiddleware::new(Arc::clone(&transport));
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Create a transport with no replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `method` request to `endpoint`
    pub fn reply(&self, method: Method, endpoint: impl Into<String>, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, endpoint.into()))
            .or_default()
            .push_back(reply);
    }

    /// Requests received so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether every queued reply has been consumed
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .all(VecDeque::is_empty)
    }

    fn next_reply(&self, method: &Method, endpoint: &str) -> Option<MockReply> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&(method.clone(), endpoint.to_string()))
            .and_then(VecDeque::pop_front)
    }
}

impl Transport for MockTransport {
    fn fetch(
        &self,
        endpoint: String,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Box<dyn Response>, ApiError>> {
        let reply = self.next_reply(&config.method, &endpoint);
        let method = config.method.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                endpoint: endpoint.clone(),
                config,
            });

        Box::pin(async move {
            let Some(reply) = reply else {
                return Err(ApiError::Transport(format!(
                    "no mock reply for {method} {endpoint}"
                )));
            };

            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }

            match reply.outcome {
                Outcome::Respond(response) => Ok(Box::new(response) as Box<dyn Response>),
                Outcome::Fail(message) => Err(ApiError::Transport(message)),
                Outcome::Hang => futures::future::pending().await,
            }
        })
    }
}

/// Buffered response produced by [`MockReply`]
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    status_text: Option<String>,
    headers: Vec<(String, String)>,
    body: String,
}

impl MockResponse {
    fn new(status: u16, body: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            status_text: None,
            headers: Vec::new(),
            body,
        }
    }

    fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl Response for MockResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    fn json(self: Box<Self>) -> BoxFuture<'static, Result<Value, ApiError>> {
        Box::pin(async move {
            serde_json::from_str(&self.body).map_err(|e| ApiError::MalformedBody(e.to_string()))
        })
    }

    fn text(self: Box<Self>) -> BoxFuture<'static, Result<String, ApiError>> {
        Box::pin(async move { Ok(self.body) })
    }

    fn status_text(&self) -> String {
        self.status_text
            .clone()
            .unwrap_or_else(|| reason_phrase(self.status))
    }
}
