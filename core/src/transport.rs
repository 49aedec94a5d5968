//! Transport abstraction
//!
//! The middleware never talks to the network directly. It hands a
//! [`RequestConfig`] to a [`Transport`] and interprets the [`Response`] it gets
//! back. The runtime crate provides a `reqwest`-backed transport; the testing
//! crate provides a scripted one.

use crate::error::ApiError;
use crate::request::RequestConfig;
use futures::future::BoxFuture;
use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

/// Issues one HTTP request per call
pub trait Transport: Send + Sync {
    /// Send a request to `endpoint`
    ///
    /// The returned future resolves once response headers are available. It
    /// fails with [`ApiError::Transport`] when no response is received.
    fn fetch(
        &self,
        endpoint: String,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Box<dyn Response>, ApiError>>;
}

impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn fetch(
        &self,
        endpoint: String,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Box<dyn Response>, ApiError>> {
        (**self).fetch(endpoint, config)
    }
}

/// A received HTTP response whose body has not been consumed yet
pub trait Response: Send {
    /// Response status
    fn status(&self) -> StatusCode;

    /// Value of the header `name` (case-insensitive), if present and textual
    fn header(&self, name: &str) -> Option<String>;

    /// Consume the body and parse it as JSON
    fn json(self: Box<Self>) -> BoxFuture<'static, Result<Value, ApiError>>;

    /// Consume the body as text
    fn text(self: Box<Self>) -> BoxFuture<'static, Result<String, ApiError>>;

    /// Whether the status is in the 2xx range
    fn ok(&self) -> bool {
        self.status().is_success()
    }

    /// Reason phrase of the status
    fn status_text(&self) -> String {
        reason_phrase(self.status())
    }
}

/// Canonical reason phrase of `status`, or its numeric code when it has none
#[must_use]
pub fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_phrase_is_never_blank() {
        assert_eq!(reason_phrase(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(reason_phrase(StatusCode::from_u16(599).unwrap_or_default()), "599");
    }
}
